// Application glue around the core: interactive prompt, scheduler and output.

pub mod prompt;
pub mod report;
pub mod scheduler;

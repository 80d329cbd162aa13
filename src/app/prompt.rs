use crate::config::ErrorPolicy;
use crate::utils::error::{CheckError, Result};
use chrono::Local;
use std::io::{BufRead, Write};
use std::path::Path;

pub const DATE_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// 互動提示取得的設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAnswers {
    pub filename: String,
    pub policy: ErrorPolicy,
}

fn timestamp() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{} [INFO]: {}", timestamp(), question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(CheckError::MissingConfigError {
            field: question.trim_end_matches(": ").to_string(),
        });
    }
    Ok(line.trim().to_string())
}

fn ask_yes_no<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    Ok(ask(input, output, question)?.eq_ignore_ascii_case("y"))
}

/// 補齊命令列沒有提供的值。檔案不存在時重新詢問；
/// 只有在忽略錯誤時才詢問是否輸出錯誤。
pub fn collect<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    filename: Option<String>,
    ignore_errors: Option<bool>,
    yield_errors: Option<bool>,
) -> Result<PromptAnswers> {
    let filename = match filename {
        Some(name) => name,
        None => loop {
            let name = ask(input, output, "Enter filename (csv): ")?;
            if Path::new(&name).exists() {
                break name;
            }
            writeln!(output, "{} [ERROR]: File is not exists", timestamp())?;
        },
    };

    let ignore_errors = match ignore_errors {
        Some(value) => value,
        None => ask_yes_no(input, output, "Ignore errors in csv? (Y/N): ")?,
    };

    let yield_errors = if ignore_errors {
        match yield_errors {
            Some(value) => value,
            None => ask_yes_no(input, output, "Print errors? (Y/N): ")?,
        }
    } else {
        false
    };

    Ok(PromptAnswers {
        filename,
        policy: ErrorPolicy::new(ignore_errors, yield_errors),
    })
}

//! Validation and interactive confirmation before files are rewritten.
//!
//! Input errors are reported before the prompt is ever shown. In JSON mode the
//! prompt goes to stderr so stdout carries JSON only.

use crate::config::{Config, RunRequest};
use std::io::{BufRead, Write};

/// What the binary should do after [`prepare_run`]
#[derive(Debug)]
pub enum Launch {
    Run(Config),
    /// The user declined, exit 0
    Aborted,
    /// Invalid input, already reported, exit 1
    Invalid,
}

/// Validates `request`, then asks for confirmation when the run modifies files.
pub fn prepare_run<R, O, E>(
    request: &RunRequest,
    input: &mut R,
    stdout: &mut O,
    stderr: &mut E,
) -> std::io::Result<Launch>
where
    R: BufRead,
    O: Write,
    E: Write,
{
    let config = match request.to_config() {
        Ok(config) => config,
        Err(e) => {
            writeln!(stdout, "Error: {}", e)?;
            return Ok(Launch::Invalid);
        }
    };

    if !config.needs_confirmation() {
        return Ok(Launch::Run(config));
    }

    let prompt: &mut dyn Write = if config.json_output { stderr } else { stdout };
    if confirm(input, prompt)? {
        Ok(Launch::Run(config))
    } else {
        writeln!(prompt, "Aborted.")?;
        Ok(Launch::Aborted)
    }
}

/// Prints the warning and reads one answer. Only "y" (any case) proceeds;
/// anything else, including EOF, declines.
pub fn confirm<R: BufRead, W: Write + ?Sized>(input: &mut R, output: &mut W) -> std::io::Result<bool> {
    writeln!(output, "WARNING: This will modify your images permanently!")?;
    writeln!(output, "Make sure you have a backup before proceeding.")?;
    write!(output, "Continue? (y/N): ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn answer(text: &str) -> (bool, String) {
        let mut input = Cursor::new(text.as_bytes().to_vec());
        let mut output = Vec::new();
        let accepted = confirm(&mut input, &mut output).unwrap();
        (accepted, String::from_utf8(output).unwrap())
    }

    fn request(dir: &TempDir, quality: i64) -> RunRequest {
        RunRequest {
            upload_path: dir.path().to_path_buf(),
            quality,
            max_width: 1920,
            max_height: 1080,
            dry_run: false,
            assume_yes: false,
            json_output: false,
        }
    }

    /// Runs `prepare_run` with `answer` on stdin, returning (launch, stdout, stderr).
    fn launch(request: &RunRequest, answer: &str) -> (Launch, String, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let launch = prepare_run(request, &mut input, &mut out, &mut err).unwrap();
        (
            launch,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_only_y_accepts() {
        assert!(answer("y\n").0);
        assert!(answer("Y\n").0);
        assert!(answer("  y  \r\n").0);
    }

    #[test]
    fn test_everything_else_declines() {
        for text in ["", "\n", "n\n", "yes\n", "N\n", "q\n", "yy\n"] {
            assert!(!answer(text).0, "input {:?}", text);
        }
    }

    #[test]
    fn test_prompt_text() {
        let (_, printed) = answer("n\n");
        assert!(printed.contains("WARNING"));
        assert!(printed.ends_with("Continue? (y/N): "));
    }

    #[test]
    fn test_invalid_quality_fails_before_prompt() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"untouched").unwrap();

        let (launch, out, err) = launch(&request(&dir, 150), "y\n");

        assert!(matches!(launch, Launch::Invalid));
        assert_eq!(out, "Error: Quality must be between 1 and 100\n");
        assert!(!out.contains("Continue?") && err.is_empty());
        assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"untouched");
    }

    #[test]
    fn test_decline_aborts() {
        let dir = TempDir::new().unwrap();
        let (launch, out, _) = launch(&request(&dir, 85), "n\n");
        assert!(matches!(launch, Launch::Aborted));
        assert!(out.contains("Continue? (y/N): "));
        assert!(out.ends_with("Aborted.\n"));
    }

    #[test]
    fn test_accept_runs() {
        let dir = TempDir::new().unwrap();
        let (launch, _, _) = launch(&request(&dir, 70), "y\n");
        match launch {
            Launch::Run(config) => assert_eq!(config.policy.quality, 70),
            other => panic!("unexpected launch {:?}", other),
        }
    }

    #[test]
    fn test_dry_run_and_yes_skip_prompt() {
        let dir = TempDir::new().unwrap();
        let mut dry = request(&dir, 85);
        dry.dry_run = true;
        let (launch_dry, out, err) = launch(&dry, "");
        assert!(matches!(launch_dry, Launch::Run(_)));
        assert!(out.is_empty() && err.is_empty());

        let mut yes = request(&dir, 85);
        yes.assume_yes = true;
        let (launch_yes, out, _) = launch(&yes, "");
        assert!(matches!(launch_yes, Launch::Run(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_mode_prompts_on_stderr() {
        let dir = TempDir::new().unwrap();
        let mut json = request(&dir, 85);
        json.json_output = true;

        let (launch, out, err) = launch(&json, "n\n");

        assert!(matches!(launch, Launch::Aborted));
        assert!(out.is_empty(), "stdout must stay JSON only: {:?}", out);
        assert!(err.contains("Continue? (y/N): "));
        assert!(err.ends_with("Aborted.\n"));
    }
}

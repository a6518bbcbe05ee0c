//! Subprocess pipeline builder.
//!
//! A small builder for the shell idiom `cat file | cmd1 | cmd2` that the CI
//! scripts lean on. Stages are spawned left to right with each stage's
//! stdout feeding the next stage's stdin, matching shell pipeline semantics:
//! an intermediate failure surfaces through the final stage's behavior.
//!
//! ```no_run
//! use brt::pipeline::Pipeline;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let head = Pipeline::cat("CHANGELOG.md")
//!     .pipe("head", ["-n1"])
//!     .output()
//!     .await?;
//! let rev = Pipeline::cmd("git", ["rev-parse", "HEAD"]).output().await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};

#[derive(Debug, Clone)]
struct Stage {
    program: String,
    args: Vec<String>,
}

/// A staged command pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stdin_file: Option<PathBuf>,
    stages: Vec<Stage>,
    cwd: Option<PathBuf>,
}

/// Outcome of [`Pipeline::status`]: exit code plus captured streams.
#[derive(Debug)]
pub struct PipelineStatus {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Pipeline {
    /// Start a pipeline whose first stage reads the given file on stdin.
    pub fn cat(path: impl Into<PathBuf>) -> Self {
        Self {
            stdin_file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Start a pipeline with a command stage.
    pub fn cmd<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().pipe(program, args)
    }

    /// Chain another command, fed from the previous stage's stdout.
    pub fn pipe<I, S>(mut self, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.push(Stage {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Run every stage in the given directory instead of the current one.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run the pipeline and capture the final stage's trimmed stdout.
    pub async fn output(self) -> Result<String> {
        let (mut last, earlier) = self.spawn(Stdio::piped(), Stdio::inherit())?;
        let stdout = last
            .stdout
            .take()
            .context("Final pipeline stage has no stdout")?;
        let mut reader = tokio::io::BufReader::new(stdout);
        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buf).await?;
        last.wait().await?;
        reap(earlier).await;
        Ok(String::from_utf8_lossy(&buf).trim().to_string())
    }

    /// Run the pipeline and report the final exit code with both captured
    /// streams; a non-zero exit is not an error here.
    pub async fn status(self) -> Result<PipelineStatus> {
        let (last, earlier) = self.spawn(Stdio::piped(), Stdio::piped())?;
        let output = last.wait_with_output().await?;
        reap(earlier).await;
        Ok(PipelineStatus {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the pipeline and fail with the captured stderr if the final stage
    /// exits non-zero. Stdout passes through untouched.
    pub async fn check(self) -> Result<()> {
        let (last, earlier) = self.spawn(Stdio::inherit(), Stdio::piped())?;
        let output = last.wait_with_output().await?;
        reap(earlier).await;
        if !output.status.success() {
            bail!(
                "Process signaled error (exit code {}), standard error:\n\n{}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    }

    /// Spawn every stage, returning the final child and the earlier ones.
    fn spawn(self, last_stdout: Stdio, last_stderr: Stdio) -> Result<(Child, Vec<Child>)> {
        if self.stages.is_empty() {
            bail!("Pipeline has no command stages");
        }

        let mut next_stdin: Stdio = match &self.stdin_file {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Stdio::from(file)
            }
            None => Stdio::null(),
        };

        let last_index = self.stages.len() - 1;
        let mut earlier = Vec::with_capacity(last_index);

        for (i, stage) in self.stages.into_iter().enumerate() {
            let mut command = Command::new(&stage.program);
            command.args(&stage.args).stdin(next_stdin);
            if let Some(dir) = &self.cwd {
                command.current_dir(dir);
            }

            if i == last_index {
                command.stdout(last_stdout).stderr(last_stderr);
                let child = command
                    .spawn()
                    .with_context(|| format!("Failed to spawn '{}'", stage.program))?;
                return Ok((child, earlier));
            }

            command.stdout(Stdio::piped()).stderr(Stdio::inherit());
            let mut child = command
                .spawn()
                .with_context(|| format!("Failed to spawn '{}'", stage.program))?;
            let stdout = child
                .stdout
                .take()
                .context("Intermediate pipeline stage has no stdout")?;
            next_stdin = stdout
                .try_into()
                .context("Failed to wire pipeline stdout into next stage")?;
            earlier.push(child);
        }

        unreachable!("loop returns on the final stage");
    }
}

/// Wait on intermediate stages so they do not linger as zombies.
async fn reap(children: Vec<Child>) {
    for mut child in children {
        let _ = child.wait().await;
    }
}

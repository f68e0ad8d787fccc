//! Child process supervision.
//!
//! The parent stays alive for exactly as long as the child, relaying
//! termination and user signals and passing the exit code through.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::process::Command;

use crate::error::{KapError, Result, SpawnFailure};

use super::env::ChildEnvironment;
use super::resolve::is_script;

/// Everything needed to start a plugin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Program handed to the OS.
    pub program: OsString,
    /// Arguments after the program.
    pub args: Vec<OsString>,
    /// The plugin entry point, which must exist.
    pub executable: PathBuf,
    pub env: ChildEnvironment,
}

impl LaunchPlan {
    /// Plan a launch of `executable`, using `interpreter` for scripts.
    pub fn new(
        executable: PathBuf,
        args: &[String],
        interpreter: &str,
        env: ChildEnvironment,
    ) -> Self {
        let mut argv: Vec<OsString> = args.iter().map(OsString::from).collect();

        let program = if is_script(&executable) {
            argv.insert(0, executable.clone().into_os_string());
            OsString::from(interpreter)
        } else {
            executable.clone().into_os_string()
        };

        Self {
            program,
            args: argv,
            executable,
            env,
        }
    }
}

/// Run the plan to completion and return the exit code to pass through.
pub fn run(plan: &LaunchPlan) -> Result<i32> {
    if !plan.executable.exists() {
        return Err(KapError::Spawn {
            path: plan.executable.clone(),
            kind: SpawnFailure::Missing,
        });
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(supervise(plan))
}

async fn supervise(plan: &LaunchPlan) -> Result<i32> {
    let mut command = Command::new(&plan.program);
    command.args(&plan.args);
    for (key, value) in plan.env.vars() {
        command.env(key, value);
    }
    for key in plan.env.removed() {
        command.env_remove(key);
    }

    tracing::debug!("Spawning {:?} {:?}", plan.program, plan.args);
    let mut child = command
        .spawn()
        .map_err(|e| spawn_error(PathBuf::from(&plan.program), e))?;

    let status = wait_relaying_signals(&mut child).await?;
    tracing::debug!("Child exited with {}", status);

    Ok(exit_code(status))
}

#[cfg(unix)]
async fn wait_relaying_signals(child: &mut tokio::process::Child) -> io::Result<ExitStatus> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    let mut hup = signal(SignalKind::hangup())?;

    loop {
        let signo = tokio::select! {
            status = child.wait() => return status,
            Some(()) = usr1.recv() => libc::SIGUSR1,
            Some(()) = usr2.recv() => libc::SIGUSR2,
            Some(()) = term.recv() => libc::SIGTERM,
            Some(()) = int.recv() => libc::SIGINT,
            Some(()) = hup.recv() => libc::SIGHUP,
        };

        forward_signal(child, signo);
    }
}

#[cfg(not(unix))]
async fn wait_relaying_signals(child: &mut tokio::process::Child) -> io::Result<ExitStatus> {
    child.wait().await
}

#[cfg(unix)]
fn forward_signal(child: &tokio::process::Child, signo: libc::c_int) {
    // id() is None once the child has been reaped
    let Some(pid) = child.id() else {
        return;
    };

    tracing::debug!("Forwarding signal {} to {}", signo, pid);
    // SAFETY: kill() only delivers a signal; pid is our own unreaped child
    let rc = unsafe { libc::kill(pid as libc::pid_t, signo) };
    if rc != 0 {
        tracing::debug!(
            "Could not forward signal {}: {}",
            signo,
            io::Error::last_os_error()
        );
    }
}

fn spawn_error(path: PathBuf, err: io::Error) -> KapError {
    match err.kind() {
        io::ErrorKind::NotFound => KapError::Spawn {
            path,
            kind: SpawnFailure::Missing,
        },
        io::ErrorKind::PermissionDenied => KapError::Spawn {
            path,
            kind: SpawnFailure::NotExecutable,
        },
        _ => KapError::Io(err),
    }
}

/// Exit code of the child; `128 + signo` when it was killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

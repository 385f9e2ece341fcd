//! Shell resolution and argument vector policy.
//!
//! Given an optional explicit shell path and a command string, decides which
//! executable to launch and with which arguments. Resolution never fails:
//! unrecognized shells fall through to the generic branch, which hands the
//! command itself to the OS launch primitive.

use std::env;
use std::path::Path;

/// How to launch a command under a given shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpawnConfig {
    pub executable: String,
    pub args: Vec<String>,
    /// True when the command string should be interpreted by the OS shell
    /// primitive instead of an explicit `-c`-style argument vector
    pub use_os_shell: bool,
}

/// Pick the shell to use: explicit argument, then the platform environment
/// variable, then the hardcoded platform fallback.
pub fn resolve_shell(explicit: Option<&str>) -> String {
    if let Some(shell) = explicit {
        if !shell.trim().is_empty() {
            return shell.to_string();
        }
    }
    if cfg!(windows) {
        env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Build the spawn configuration for `command` under `shell_path`.
///
/// Policy by shell basename (case-insensitive): login-shell `-c` for the
/// POSIX shells, `-Login`/`-Command` for the PowerShell variants, UTF-8
/// code-page priming for the Windows command processor, and a generic
/// OS-delegated branch for anything else.
pub fn shell_spawn_config(shell_path: &str, command: &str) -> ShellSpawnConfig {
    let shell_name = Path::new(shell_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if shell_name.contains("bash") || shell_name.contains("zsh") || shell_name.contains("fish") {
        return ShellSpawnConfig {
            executable: shell_path.to_string(),
            args: vec!["-l".to_string(), "-c".to_string(), command.to_string()],
            use_os_shell: false,
        };
    }

    if shell_name == "pwsh" || shell_name == "pwsh.exe" {
        return ShellSpawnConfig {
            executable: shell_path.to_string(),
            args: vec![
                "-Login".to_string(),
                "-Command".to_string(),
                command.to_string(),
            ],
            use_os_shell: false,
        };
    }

    if shell_name == "powershell" || shell_name == "powershell.exe" {
        return ShellSpawnConfig {
            executable: shell_path.to_string(),
            args: vec!["-Command".to_string(), command.to_string()],
            use_os_shell: false,
        };
    }

    if shell_name == "cmd" || shell_name == "cmd.exe" {
        // Switch the code page to UTF-8 before the command runs so non-ASCII
        // output survives the pipe
        let utf8_command = format!("chcp 65001 >nul && {}", command);
        return ShellSpawnConfig {
            executable: shell_path.to_string(),
            args: vec!["/c".to_string(), utf8_command],
            use_os_shell: false,
        };
    }

    ShellSpawnConfig {
        executable: command.to_string(),
        args: Vec::new(),
        use_os_shell: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bash_and_zsh_get_login_shell_args() {
        for shell in ["/bin/bash", "/usr/bin/zsh", "/opt/homebrew/bin/bash"] {
            let config = shell_spawn_config(shell, "echo hi");
            assert_eq!(config.executable, shell);
            assert_eq!(config.args, vec!["-l", "-c", "echo hi"]);
            assert!(!config.use_os_shell);
        }
    }

    #[test]
    fn fish_gets_login_shell_args() {
        let config = shell_spawn_config("/usr/bin/fish", "ls");
        assert_eq!(config.args, vec!["-l", "-c", "ls"]);
    }

    #[test]
    fn powershell_variants_differ_in_login_flag() {
        let pwsh = shell_spawn_config("pwsh", "Get-Date");
        assert_eq!(pwsh.args, vec!["-Login", "-Command", "Get-Date"]);

        let powershell = shell_spawn_config("powershell.exe", "Get-Date");
        assert_eq!(powershell.args, vec!["-Command", "Get-Date"]);
    }

    #[test]
    fn cmd_primes_utf8_code_page() {
        let config = shell_spawn_config("C:\\Windows\\System32\\cmd.exe", "dir");
        assert_eq!(config.executable, "C:\\Windows\\System32\\cmd.exe");
        assert_eq!(config.args, vec!["/c", "chcp 65001 >nul && dir"]);
    }

    #[test]
    fn unrecognized_shell_delegates_to_os() {
        let config = shell_spawn_config("/usr/bin/nushell", "ls -la");
        assert_eq!(config.executable, "ls -la");
        assert!(config.args.is_empty());
        assert!(config.use_os_shell);
    }

    #[test]
    fn basename_match_is_case_insensitive() {
        let config = shell_spawn_config("/weird/BASH", "true");
        assert_eq!(config.args, vec!["-l", "-c", "true"]);
    }

    #[test]
    fn explicit_shell_wins_resolution() {
        assert_eq!(resolve_shell(Some("/bin/dash")), "/bin/dash");
        // Empty explicit values fall through to the environment/default path
        let fallback = resolve_shell(Some("  "));
        assert!(!fallback.is_empty());
    }
}

//! systemd user unit generation

use std::ffi::OsString;
use std::fmt::Write;
use std::path::Path;

/// Flag that requests the unit; never copied into ExecStart
pub const PRINT_UNIT_FLAG: &str = "--print-unit";

/// Arguments to carry into the unit.
///
/// Everything after argv[0] except the print flag. Any `--config`/`-c`
/// argument is replaced by `config`, which must already be absolute since
/// systemd does not start the service in the caller's directory.
/// Fails with the first argument that is not UTF-8.
pub fn daemon_args(
    argv: impl IntoIterator<Item = OsString>,
    config: Option<&Path>,
) -> Result<Vec<String>, OsString> {
    let mut args = Vec::new();
    let mut skip_value = false;

    for arg in argv.into_iter().skip(1) {
        let arg = arg.into_string()?;
        if std::mem::take(&mut skip_value) {
            continue;
        }

        match arg.as_str() {
            PRINT_UNIT_FLAG => {}
            "--config" | "-c" => skip_value = true,
            a if a.starts_with("--config=") => {}
            a if a.starts_with("-c") && !a.starts_with("--") => {}
            _ => args.push(arg),
        }
    }

    if let Some(path) = config {
        let path = path
            .to_str()
            .ok_or_else(|| path.as_os_str().to_os_string())?;
        args.push("--config".to_string());
        args.push(path.to_string());
    }

    Ok(args)
}

/// Render a systemd user unit that runs `exe` with `args`.
///
/// Install with `systemctl --user enable --now wardend.service` after
/// writing it to `~/.config/systemd/user/wardend.service`.
pub fn render_user_unit(exe: &Path, args: &[String]) -> String {
    let mut exec = quote_arg(&exe.to_string_lossy());
    for arg in args {
        exec.push(' ');
        exec.push_str(&quote_arg(arg));
    }

    let mut unit = String::with_capacity(512);

    writeln!(unit, "[Unit]").ok();
    writeln!(unit, "Description=appwarden per-application time budgets").ok();
    writeln!(unit, "After=graphical-session.target").ok();
    writeln!(unit).ok();

    writeln!(unit, "[Service]").ok();
    writeln!(unit, "Type=simple").ok();
    writeln!(unit, "ExecStart={exec}").ok();
    writeln!(unit, "Restart=on-failure").ok();
    writeln!(unit, "RestartSec=5").ok();
    writeln!(unit, "NoNewPrivileges=true").ok();
    writeln!(unit).ok();

    writeln!(unit, "[Install]").ok();
    writeln!(unit, "WantedBy=default.target").ok();

    unit
}

/// Quote one word for an ExecStart line
fn quote_arg(arg: &str) -> String {
    // systemd expands % specifiers even inside quotes
    let escaped = arg.replace('%', "%%");

    let needs_quotes = escaped.is_empty()
        || escaped
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | ';' | '$'));
    if !needs_quotes {
        return escaped;
    }

    let mut quoted = String::with_capacity(escaped.len() + 2);
    quoted.push('"');
    for c in escaped.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '$' => quoted.push_str("$$"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn drops_program_and_print_flag() {
        let args = daemon_args(argv(&["wardend", "--rule", "Safari=1h", "--print-unit"]), None);
        assert_eq!(args, Ok(vec!["--rule".to_string(), "Safari=1h".to_string()]));
    }

    #[test]
    fn config_path_is_replaced_by_absolute_one() {
        let absolute = Path::new("/home/user/warden.toml");

        for raw in [
            argv(&["wardend", "-c", "warden.toml", "--print-unit"]),
            argv(&["wardend", "--config", "warden.toml", "--print-unit"]),
            argv(&["wardend", "--config=warden.toml", "--print-unit"]),
            argv(&["wardend", "-cwarden.toml", "--print-unit"]),
        ] {
            assert_eq!(
                daemon_args(raw, Some(absolute)),
                Ok(vec![
                    "--config".to_string(),
                    "/home/user/warden.toml".to_string()
                ])
            );
        }
    }

    #[test]
    fn non_utf8_argument_is_rejected() {
        use std::os::unix::ffi::OsStringExt;

        let bad = OsString::from_vec(vec![b'c', 0xff, b'.', b't']);
        let raw = vec![OsString::from("wardend"), OsString::from("--rule"), bad.clone()];

        assert_eq!(daemon_args(raw, None), Err(bad));
    }

    #[test]
    fn renders_exec_start() {
        let args = vec![
            "--rule".to_string(),
            "Discord Helper=30m@18-22".to_string(),
            "--log-format".to_string(),
            "json".to_string(),
        ];
        let unit = render_user_unit(Path::new("/usr/local/bin/wardend"), &args);

        assert!(unit.contains(
            "ExecStart=/usr/local/bin/wardend --rule \"Discord Helper=30m@18-22\" --log-format json\n"
        ));
        assert!(unit.contains("[Install]\nWantedBy=default.target"));
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_arg("plain"), "plain");
        assert_eq!(quote_arg(""), "\"\"");
        assert_eq!(quote_arg("50%"), "50%%");
        assert_eq!(quote_arg("a \"b\""), "\"a \\\"b\\\"\"");
        assert_eq!(quote_arg("$HOME x"), "\"$$HOME x\"");
    }
}

//! Utility functions for use in other parts of tatami
use crate::{core::bindings::CodeMap, Result};
use std::{
    io::Read,
    process::{Command, Stdio},
};
use tracing::info;

/// Run an external command
///
/// This redirects the process stdout and stderr to /dev/null.
pub fn spawn<S: Into<String>>(cmd: S) -> Result<()> {
    let s = cmd.into();
    let parts: Vec<&str> = s.split_whitespace().collect();
    let result = if parts.len() > 1 {
        Command::new(parts[0])
            .args(&parts[1..])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    } else {
        Command::new(parts[0])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    };

    match result {
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Run an external command and return its output.
pub fn spawn_for_output<S: Into<String>>(cmd: S) -> Result<String> {
    let cmd = cmd.into();
    info!(?cmd, "spawning subprocess for output");
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let result = if parts.len() > 1 {
        Command::new(parts[0])
            .stdout(Stdio::piped())
            .args(&parts[1..])
            .spawn()
    } else {
        Command::new(parts[0]).stdout(Stdio::piped()).spawn()
    };

    let child = result?;
    let mut buff = String::new();
    Ok(child
        .stdout
        .ok_or_else(|| custom_error!("no stdout from {}", cmd))?
        .read_to_string(&mut buff)
        .map(|_| buff)?)
}

/// Run the xmodmap command to dump the system keymap table.
///
/// This is done in a form that we can load in and convert back to key
/// codes. This lets the user define key bindings in the way that they
/// would expect while also ensuring that it is easy to debug any odd
/// issues with bindings by referring the user to the xmodmap output.
pub fn keycodes_from_xmodmap() -> Result<CodeMap> {
    let output = spawn_for_output("xmodmap -pke")?;

    let mut map = CodeMap::new();
    for l in output.lines() {
        // keycode <code> = <names ...>
        let mut words = l.split_whitespace();
        let code: u8 = match words.nth(1) {
            Some(word) => word
                .parse()
                .map_err(|_| custom_error!("unexpected xmodmap output: {}", l))?,
            None => return Err(custom_error!("unexpected xmodmap output: {}", l)),
        };

        for name in words.skip(1) {
            map.entry(name.to_string()).or_insert(code);
        }
    }

    Ok(map)
}

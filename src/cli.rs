//! Clap backend.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Fields
//! annotated `cli:<name>` become `--<name>` flags: [`bind_cli`] registers them
//! on a [`Command`], and [`Cli`] reads back only the flags the user actually
//! typed. A flag left at its registered default reports no entry, so lower
//! sources and the field's own default still apply.
//!
//! ```ignore
//! let cmd = bind_cli(Command::new("myapp"), &mut settings)?;
//! let matches = cmd.get_matches();
//! Conf::builder().cli(Cli::new(&matches)).build()?.load(&mut settings)?;
//! ```

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::error::ConfError;
use crate::field::{Field, fields};
use crate::settings::Settings;
use crate::source::Source;

/// Register a flag for every CLI-eligible field of `spec`.
///
/// Booleans become value-less switches. The field's default, if any, is shown
/// as the flag's default.
pub fn bind_cli<S: Settings>(mut cmd: Command, spec: &mut S) -> Result<Command, ConfError> {
    let found = fields(spec, None)?;
    let mut bound = 0;
    for field in &found {
        if let Some(arg) = flag_for(field) {
            cmd = cmd.arg(arg);
            bound += 1;
        }
    }
    debug!(flags = bound, "registered cli flags");
    Ok(cmd)
}

fn flag_for(field: &Field<'_>) -> Option<Arg> {
    let name = field.cli_flag()?;
    let mut arg = Arg::new(name.to_string()).long(name.to_string());

    if let Some(short) = field.options.cli_short {
        arg = arg.short(short);
    }
    if let Some(usage) = &field.options.cli_usage {
        arg = arg.help(usage.clone());
    }

    if field.is_switch() {
        arg = arg.action(ArgAction::SetTrue);
    } else {
        arg = arg.action(ArgAction::Set);
        if let Some(default) = field.default_value() {
            arg = arg.default_value(default.to_string());
        }
    }
    Some(arg)
}

/// Values of explicitly given flags.
#[derive(Debug, Clone, Copy)]
pub struct Cli<'m> {
    matches: &'m ArgMatches,
}

impl<'m> Cli<'m> {
    pub fn new(matches: &'m ArgMatches) -> Self {
        Self { matches }
    }
}

impl Source for Cli<'_> {
    fn name(&self) -> &str {
        "cli"
    }

    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError> {
        let Some(flag) = field.cli_flag() else {
            return Ok(None);
        };
        if !self.matches.try_contains_id(flag).unwrap_or(false)
            || self.matches.value_source(flag) != Some(ValueSource::CommandLine)
        {
            return Ok(None);
        }

        if field.is_switch() {
            let on = self
                .matches
                .try_get_one::<bool>(flag)
                .map_err(|e| ConfError::backend("cli", flag, e))?
                .copied()
                .unwrap_or(false);
            return Ok(Some(on.to_string()));
        }

        Ok(self
            .matches
            .try_get_one::<String>(flag)
            .map_err(|e| ConfError::backend("cli", flag, e))?
            .cloned())
    }
}

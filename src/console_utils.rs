//! Log formatting and the terminal writer shared with progress bars.

use std::{io, str::FromStr, sync::LazyLock};

use clap_verbosity_flag::log::LevelFilter;
use indicatif::MultiProgress;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    filter::{Directive, ParseError},
    fmt::{
        self, FmtContext, FormatEvent, FormatFields, MakeWriter,
        format::{self, Format, Writer},
    },
    prelude::*,
    registry::LookupSpan,
};

/// How log lines are rendered.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogStyle {
    /// Bare messages for gemkit's own info logs, full format otherwise
    #[default]
    Fancy,
    /// The default `tracing` format for every line
    Plain,
    /// One JSON object per line
    Json,
}

/// Whether to emit colored output.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Color {
    /// Always color
    Always,
    /// Never color
    Never,
    /// Color when writing to a terminal
    #[default]
    Auto,
}

impl Color {
    /// Apply the choice to the `console` crate's global switches.
    pub fn apply(self) {
        match self {
            Color::Always => {
                console::set_colors_enabled(true);
                console::set_colors_enabled_stderr(true);
            }
            Color::Never => {
                console::set_colors_enabled(false);
                console::set_colors_enabled_stderr(false);
            }
            Color::Auto => {}
        }
    }
}

/// Writes to stderr without tearing the progress bars.
#[derive(Clone)]
pub struct IndicatifWriter {
    progress_bars: MultiProgress,
}

impl IndicatifWriter {
    pub(crate) fn new(pb: MultiProgress) -> Self {
        Self { progress_bars: pb }
    }
}

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress_bars.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.progress_bars.suspend(|| io::stderr().flush())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Prints info level events of gemkit as bare messages.
pub struct TracingFormatter;

impl<S, N> FormatEvent<S, N> for TracingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let mut buffer = String::new();
        let mut custom_writer = Writer::new(&mut buffer);

        if *metadata.level() == tracing_core::metadata::Level::INFO
            && metadata.target().starts_with("gemkit")
        {
            ctx.format_fields(custom_writer.by_ref(), event)?;
            buffer.push('\n');
        } else {
            let default_format = Format::default().with_ansi(writer.has_ansi_escapes());
            default_format.format_event(ctx, custom_writer, event)?;
        }

        writer.write_str(&filter_secrets(&buffer))
    }
}

static RUBYGEMS_API_KEY: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\brubygems_[0-9a-f]{48}\b").expect("static regex is valid")
});

/// Hide RubyGems API keys that end up in logged command lines.
pub fn filter_secrets(line: &str) -> std::borrow::Cow<'_, str> {
    RUBYGEMS_API_KEY.replace_all(line, "rubygems_<token>")
}

/// The filter used when `RUST_LOG` is not set.
pub fn get_default_env_filter(verbose: LevelFilter) -> Result<EnvFilter, ParseError> {
    let level = match verbose {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    };

    let mut result = EnvFilter::new("");
    for crate_name in ["gemkit", "gemkit_files"] {
        result = result.add_directive(Directive::from_str(&format!("{crate_name}={level}"))?);
    }
    Ok(result)
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_logging(
    log_style: LogStyle,
    verbose: LevelFilter,
    color: Color,
) -> miette::Result<MultiProgress> {
    color.apply();
    let multi_progress = MultiProgress::new();
    let writer = IndicatifWriter::new(multi_progress.clone());
    let ansi = console::colors_enabled_stderr();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => get_default_env_filter(verbose)
            .map_err(|e| miette::miette!("invalid log filter: {e}"))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match log_style {
        LogStyle::Fancy => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .event_format(TracingFormatter),
            )
            .try_init(),
        LogStyle::Plain => registry
            .with(fmt::layer().with_writer(writer).with_ansi(ansi))
            .try_init(),
        LogStyle::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
    };
    result.map_err(|e| miette::miette!("failed to install the logger: {e}"))?;

    Ok(multi_progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_secrets() {
        let key = format!("rubygems_{}", "0a".repeat(24));
        let line = format!("running gem push --key {key} pkg/a.tar.gz");
        assert_eq!(
            filter_secrets(&line),
            "running gem push --key rubygems_<token> pkg/a.tar.gz"
        );
        assert_eq!(filter_secrets("nothing secret"), "nothing secret");
    }

    #[test]
    fn test_default_filter_levels() {
        let filter = get_default_env_filter(LevelFilter::Debug).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("gemkit=debug"), "{rendered}");
        assert!(rendered.contains("gemkit_files=debug"), "{rendered}");
    }
}

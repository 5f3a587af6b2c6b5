//! Log subscriber setup
//!
//! Native builds log to stdout. With the `web` feature each formatted event is
//! forwarded to the browser console at the matching console level.

use std::str::FromStr;

use tracing::Level;

/// Parse a level name, falling back to `info`
pub fn parse_level(name: &str) -> Level {
    Level::from_str(name.trim()).unwrap_or(Level::INFO)
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(level: Level) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    #[cfg(feature = "web")]
    let result = builder
        .with_ansi(false)
        .without_time()
        .with_writer(console::MakeConsoleWriter)
        .try_init();

    #[cfg(not(feature = "web"))]
    let result = builder.try_init();

    if result.is_err() {
        tracing::debug!("Log subscriber already installed");
    }
}

#[cfg(feature = "web")]
mod console {
    use std::io::{self, Write};

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    pub struct MakeConsoleWriter;

    /// Buffers one formatted event and writes it to the console on drop
    pub struct ConsoleWriter {
        level: Level,
        buffer: Vec<u8>,
    }

    impl Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let text = String::from_utf8_lossy(&self.buffer);
            let line = JsValue::from_str(text.trim_end());
            match self.level {
                Level::ERROR => web_sys::console::error_1(&line),
                Level::WARN => web_sys::console::warn_1(&line),
                Level::INFO => web_sys::console::info_1(&line),
                Level::DEBUG => web_sys::console::log_1(&line),
                _ => web_sys::console::debug_1(&line),
            }
        }
    }

    impl<'a> MakeWriter<'a> for MakeConsoleWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: Level::INFO,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buffer: Vec::new(),
            }
        }
    }
}

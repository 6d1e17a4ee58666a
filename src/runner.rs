use log::{info, warn};
use std::io::Write;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::{Mode, RunConfig};
use crate::envelope::{Envelope, SINGLE_ADD_REQUEST};
use crate::error::{Result, TransportError};
use crate::transport::{ResponseBody, Transport};

pub type ItemTemplate = Box<dyn Fn(usize) -> String + Send + Sync>;

/// Outcome of the single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Returned(ResponseBody),
    Failed(TransportError),
}

impl Report {
    pub fn is_success(&self) -> bool {
        matches!(self, Report::Returned(_))
    }
}

/// Builds the envelope, optionally dumps it, sends it once and writes the
/// outcome to `console`.
pub struct Runner<W> {
    config: RunConfig,
    template: ItemTemplate,
    console: W,
}

impl<W: Write> Runner<W> {
    pub fn new(config: RunConfig, template: ItemTemplate, console: W) -> Self {
        Self {
            config,
            template,
            console,
        }
    }

    #[cfg(test)]
    pub fn into_console(self) -> W {
        self.console
    }

    /// Assembles the request body, printing one progress line per batch item.
    pub fn build_body(&mut self) -> Result<String> {
        let envelope = match self.config.mode {
            Mode::Single => Envelope::single(SINGLE_ADD_REQUEST),
            Mode::Batch => {
                let template = &self.template;
                let count = self.config.item_count;
                let envelope = Envelope::batch(&self.config.request_id, count, |i| template(i));
                for i in 0..count {
                    writeln!(self.console, "adding request {i} ")?;
                }
                envelope
            }
        };
        info!("assembled {} bytes of request content", envelope.body().len());
        Ok(envelope.render())
    }

    fn dump(&self, body: &str) {
        if self.config.mode != Mode::Batch {
            return;
        }
        let Some(path) = &self.config.dump_path else {
            return;
        };
        match std::fs::write(path, body) {
            Ok(()) => info!("wrote {} bytes to {}", body.len(), path.display()),
            Err(err) => warn!("could not write {}: {err}", path.display()),
        }
    }

    pub async fn run<T>(&mut self, transport: &T) -> Result<Report>
    where
        T: Transport + ?Sized,
    {
        let body = self.build_body()?;
        self.dump(&body);

        writeln!(self.console, "posting file... to {} ", self.config.url)?;
        let batch = self.config.mode == Mode::Batch;
        let started = Instant::now();
        if batch {
            writeln!(self.console, "starting at {} ", unix_secs())?;
            writeln!(self.console, "about to post: ")?;
        }

        let report = match transport.send(&body, &self.config.headers()).await {
            Ok(res) => {
                classify(&res);
                writeln!(self.console, "***RETURNED: ")?;
                self.console.write_all(&res.body)?;
                if batch {
                    writeln!(self.console, "finishing at {} ", unix_secs())?;
                    writeln!(
                        self.console,
                        "operation took {} seconds ",
                        started.elapsed().as_secs()
                    )?;
                }
                Report::Returned(res)
            }
            // A failed batch run stops here without timing lines.
            Err(err) => {
                writeln!(self.console, "error: {err}")?;
                Report::Failed(err)
            }
        };
        self.console.flush()?;

        Ok(report)
    }
}

/// Warns about responses that reached us but probably did not provision
/// anything. They are still reported as returned.
fn classify(res: &ResponseBody) {
    if !res.status.is_success() {
        warn!("endpoint answered with HTTP {}", res.status);
    }
    if is_soap_fault(&res.text()) {
        warn!("response carries a SOAP Fault");
    }
}

fn is_soap_fault(body: &str) -> bool {
    body.contains(":Fault>") || body.contains("<Fault>") || body.contains(":Fault ")
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

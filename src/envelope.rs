//! SOAP envelopes carrying SPML 1.0 provisioning requests.
//!
//! Everything here is pure string assembly; nothing touches the network.

pub const SOAP_HEADER: &str = "<soap-env:Envelope xmlns:soap-env=\"http://schemas.xmlsoap.org/soap/envelope/\"><soap-env:Body>";
pub const SOAP_FOOTER: &str = "</soap-env:Body></soap-env:Envelope>";

pub const BATCH_FOOTER: &str = "</batchRequest></soap-env:Body></soap-env:Envelope>";

/// The single `addRequest` sent in single-request mode.
pub const SINGLE_ADD_REQUEST: &str = concat!(
    "<addRequest xmlns=\"urn:oasis:names:tc:SPML:1:0\"><attributes>",
    "<attr name=\"objectclass\"><value>User</value></attr>",
    "<attr name=\"CN\"><value>BSTSEA001TTXTIA001</value></attr>",
    "<attr name=\"Surname\"><value>Tait</value></attr>",
    "<attr name=\"Full Name\"><value>Tiana Tait</value></attr>",
    "<attr name=\"Given Name\"><value>Tiana</value></attr>",
    "<attr name=\"Initials\"><value>T</value></attr>",
    "<attr name=\"nspmDistributionPassword\"><value>BSTSEA001</value></attr>",
    "</attributes></addRequest>",
);

/// Opening of a `batchRequest` envelope, up to and including the
/// `batchRequest` start tag.
pub fn batch_header(request_id: &str) -> String {
    format!(
        "{SOAP_HEADER}<batchRequest xmlns:spml=\"urn:oasis:names:tc:SPML:1:0\" \
         requestID=\"{request_id}\"\nprocessing =\"parallel\" execution=\"synchronous\">"
    )
}

/// Synthetic user entry for batch position `index`.
pub fn add_request_item(index: usize) -> String {
    format!(
        "<addRequest>\n\
         <attributes>\n\
         <attr name=\"objectclass\"> <value>User</value></attr>\n\
         <attr name=\"CN\"> <value>User{index}</value></attr>\n\
         <attr name=\"Given Name\"><value>Something{index}</value></attr>\n\
         <attr name=\"Surname\"><value>Surname{index}</value></attr>\n\
         </attributes>\n\
         </addRequest>\n"
    )
}

/// Concatenates header, items and footer with nothing in between.
pub fn assemble<I, S>(header: &str, items: I, footer: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from(header);
    for item in items {
        out.push_str(item.as_ref());
    }
    out.push_str(footer);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    header: String,
    body: String,
    footer: String,
}

impl Envelope {
    pub fn new<I, S>(header: impl Into<String>, items: I, footer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            header: header.into(),
            body: assemble("", items, ""),
            footer: footer.into(),
        }
    }

    /// Envelope around one static payload.
    pub fn single(payload: &str) -> Self {
        Self::new(SOAP_HEADER, [payload], SOAP_FOOTER)
    }

    /// `batchRequest` envelope with `count` items generated by `item`.
    pub fn batch<F>(request_id: &str, count: usize, item: F) -> Self
    where
        F: FnMut(usize) -> String,
    {
        Self::new(batch_header(request_id), (0..count).map(item), BATCH_FOOTER)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn render(&self) -> String {
        assemble(&self.header, [&self.body], &self.footer)
    }
}

use crate::errors::ClientError;
use mail_parser::MessageParser;

/// A fetched email decoded into headers and bodies.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub id: String,
    pub subject: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    /// RFC 3339 rendering of the `Date` header
    pub date: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub raw: Vec<u8>,
}

impl ParsedMessage {
    pub fn parse(id: impl Into<String>, raw: Vec<u8>) -> Result<Self, ClientError> {
        let decoded = Self::decode(id.into(), &raw)?;
        Ok(Self { raw, ..decoded })
    }

    fn decode(id: String, raw: &[u8]) -> Result<Self, ClientError> {
        let Some(message) = MessageParser::default().parse(raw) else {
            return Err(ClientError::MalformedMessage { id });
        };

        let sender = message.from().and_then(|list| list.first());
        let from_address = sender.and_then(|a| a.address.as_deref()).map(str::to_string);
        let from_name = sender.and_then(|a| a.name.as_deref()).map(str::to_string);

        // Raw wire value, not decoded
        let headers = message
            .headers()
            .iter()
            .map(|header| {
                let value = raw
                    .get(header.offset_start as usize..header.offset_end as usize)
                    .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
                    .unwrap_or_default();
                (header.name().to_string(), value)
            })
            .collect();

        Ok(Self {
            id,
            subject: message.subject().map(str::to_string),
            from_address,
            from_name,
            date: message.date().map(|d| d.to_rfc3339()),
            text_body: message.body_text(0).map(|b| b.into_owned()),
            html_body: message.body_html(0).map(|b| b.into_owned()),
            headers,
            raw: Vec::new(),
        })
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn summary(&self) -> String {
        format!(
            "[{}] {} | {} | {}",
            self.id,
            self.date.as_deref().unwrap_or("-"),
            self.from_address.as_deref().unwrap_or("<unknown>"),
            self.subject.as_deref().unwrap_or("(no subject)")
        )
    }
}

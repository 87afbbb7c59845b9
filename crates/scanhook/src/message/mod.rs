use std::fmt::Display;

use crate::models::{Attachment, ChatMessage, Field, HostReport, ResponseType, ScanReport};

pub fn rejection() -> ChatMessage {
    text_message(ResponseType::Ephemeral, "Please include a valid IP or domain.")
}

pub fn out_of_scope(target: &str) -> ChatMessage {
    text_message(
        ResponseType::Ephemeral,
        format!("{target} is outside the allowed scan scope."),
    )
}

pub fn accepted(target: &str) -> ChatMessage {
    text_message(
        ResponseType::InChannel,
        format!("Scanning {target} now, your results will be posted to this channel soon."),
    )
}

pub fn scan_failed(err: &impl Display) -> ChatMessage {
    text_message(
        ResponseType::InChannel,
        format!("nmap encountered an error! {err}"),
    )
}

pub fn scan_results(target: &str, report: &ScanReport) -> ChatMessage {
    let host = report.hosts.first();
    let mut fields = FieldList::default();

    fields.add(
        "IP Address",
        host.and_then(|h| h.addresses.first()).cloned(),
        true,
    );
    fields.add(
        "Status",
        host.and_then(|h| h.state.as_deref())
            .filter(|s| !s.is_empty())
            .map(|s| format!("Host is {s}")),
        true,
    );
    fields.add("Open Ports", host.and_then(port_list), false);
    fields.add("Command Used", report.args.clone(), false);
    fields.add(
        "Summary",
        report.runstats.as_ref().and_then(|r| r.summary.clone()),
        false,
    );

    ChatMessage {
        response_type: ResponseType::InChannel,
        text: None,
        attachments: vec![Attachment {
            title: format!("nmap scan results for {target}"),
            fields: fields.0,
        }],
    }
}

fn port_list(host: &HostReport) -> Option<String> {
    let lines: Vec<String> = host
        .ports
        .iter()
        .map(|p| {
            format!(
                "{}/{}  ({})",
                p.portid,
                p.protocol,
                p.service_name.as_deref().unwrap_or("unknown")
            )
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(format!("• {}", lines.join("\n • ")))
    }
}

fn text_message(response_type: ResponseType, text: impl Into<String>) -> ChatMessage {
    ChatMessage {
        response_type,
        text: Some(text.into()),
        attachments: vec![],
    }
}

#[derive(Default)]
struct FieldList(Vec<Field>);

impl FieldList {
    fn add(&mut self, title: &str, value: Option<String>, short: bool) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.0.push(Field {
                title: title.to_string(),
                value,
                short,
            });
        }
    }
}

use quick_xml::de::from_str;

use crate::{
    adapters::ScanError,
    models::{HostReport, PortReport, RunStats, ScanReport},
};

#[derive(Debug, serde::Deserialize)]
struct NmapRun {
    #[serde(rename = "@args", default)]
    args: Option<String>,
    #[serde(rename = "host", default)]
    hosts: Vec<NmapHost>,
    #[serde(default)]
    runstats: Option<NmapRunStats>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapHost {
    #[serde(default)]
    status: Option<NmapState>,
    #[serde(rename = "address", default)]
    addresses: Vec<NmapAddress>,
    #[serde(default)]
    hostnames: Option<NmapHostnames>,
    #[serde(default)]
    ports: Option<NmapPorts>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapAddress {
    #[serde(rename = "@addr")]
    addr: String,
}

#[derive(Debug, serde::Deserialize)]
struct NmapHostnames {
    #[serde(rename = "hostname", default)]
    hostnames: Vec<NmapHostname>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapHostname {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, serde::Deserialize)]
struct NmapPorts {
    #[serde(rename = "port", default)]
    ports: Vec<NmapPort>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapPort {
    #[serde(rename = "@portid")]
    portid: u16,
    #[serde(rename = "@protocol")]
    protocol: String,
    state: NmapState,
    #[serde(default)]
    service: Option<NmapService>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapState {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, serde::Deserialize)]
struct NmapService {
    #[serde(rename = "@name", default)]
    name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapRunStats {
    #[serde(default)]
    finished: Option<NmapFinished>,
}

#[derive(Debug, serde::Deserialize)]
struct NmapFinished {
    #[serde(rename = "@summary", default)]
    summary: Option<String>,
    #[serde(rename = "@elapsed", default)]
    elapsed: Option<String>,
    #[serde(rename = "@exit", default)]
    exit: Option<String>,
}

pub fn parse_nmap_xml(xml: &str) -> Result<ScanReport, ScanError> {
    let run: NmapRun = from_str(xml)?;

    let hosts = run
        .hosts
        .into_iter()
        .map(|host| HostReport {
            addresses: host.addresses.into_iter().map(|a| a.addr).collect(),
            state: host.status.map(|s| s.state),
            hostnames: host
                .hostnames
                .map(|h| h.hostnames.into_iter().map(|n| n.name).collect())
                .unwrap_or_default(),
            ports: host
                .ports
                .map(|p| {
                    p.ports
                        .into_iter()
                        .map(|port| PortReport {
                            portid: port.portid,
                            protocol: port.protocol,
                            state: port.state.state,
                            service_name: port.service.and_then(|s| s.name),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();

    let runstats = run.runstats.and_then(|r| r.finished).map(|f| RunStats {
        summary: f.summary,
        elapsed: f.elapsed,
        exit: f.exit,
    });

    Ok(ScanReport {
        args: run.args,
        hosts,
        runstats,
    })
}

use std::thread;
use std::time::Duration;

use clap::Parser;
use ifsnap::{Interface, InterfaceTable, NetMonitor, SignalTier};

#[derive(Parser)]
#[command(about = "Render the interface snapshot as a status-line fragment", long_about = None)]
struct Cli {
    /// Seconds between polls
    #[arg(short, long, default_value_t = 1)]
    interval: u64,

    /// Append SSID, quality and interface-name detail
    #[arg(short, long)]
    wordy: bool,

    /// Poll once and exit
    #[arg(short, long)]
    once: bool,
}

fn main() -> Result<(), ifsnap::Error> {
    let cli = Cli::parse();
    let mut monitor = NetMonitor::open()?;

    loop {
        let table = monitor.poll()?;
        println!("{}", render(&table, cli.wordy));
        if cli.once {
            return Ok(());
        }
        thread::sleep(Duration::from_secs(cli.interval));
    }
}

fn render(table: &InterfaceTable, wordy: bool) -> String {
    let mut out = String::new();
    for interface in table {
        if append_interface(&mut out, interface, wordy) {
            out.push_str(" | ");
        }
    }
    out.truncate(out.trim_end_matches(" | ").len());
    out
}

/// One status token per interface, mirroring the wifi0..wifi3 icon ladder:
/// the tier picks the glyph, address presence picks the variant, and
/// wireless interfaces with no usable scan/station data fall back to the
/// bare variant. Wired interfaces appear only when they hold an address.
fn append_interface(out: &mut String, interface: &Interface, wordy: bool) -> bool {
    if interface.is_wifi {
        match (interface.signal_tier(), interface.ssid.as_deref()) {
            (Some(tier), Some(ssid)) => {
                let glyph = match (tier, interface.has_addr) {
                    (SignalTier::High, true) => "wifi3",
                    (SignalTier::High, false) => "wifi3-noaddr",
                    (SignalTier::Medium, true) => "wifi2",
                    (SignalTier::Medium, false) => "wifi2-noaddr",
                    (SignalTier::Low, true) => "wifi1",
                    (SignalTier::Low, false) => "wifi1-noaddr",
                };
                out.push('[');
                out.push_str(glyph);
                out.push(']');
                if wordy {
                    out.push(' ');
                    push_escaped(out, ssid);
                    let quality = interface.signal_quality().unwrap_or(0);
                    out.push_str(&format!(" {:3}%", quality));
                }
            }
            _ => out.push_str("[wifi0]"),
        }
        true
    } else if interface.has_addr {
        out.push_str("[wired]");
        if wordy {
            out.push(' ');
            out.push_str(&interface.if_name);
        }
        true
    } else {
        false
    }
}

fn push_escaped(out: &mut String, bytes: &[u8]) {
    for &byte in bytes {
        if (0x20..0x7f).contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("\\x{:02x}", byte));
        }
    }
}

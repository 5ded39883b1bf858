use ifsnap::NetMonitor;

fn main() -> Result<(), ifsnap::Error> {
    let mut monitor = NetMonitor::open()?;
    if !monitor.wifi_available() {
        println!("(nl80211 not available, wireless state disabled)");
    }

    let table = monitor.poll()?;
    for interface in &table {
        println!("Interface: {} ({})", interface.if_name, interface.if_index);
        println!(
            "  address: {}",
            if interface.has_addr { "yes" } else { "no" }
        );
        if interface.is_wifi {
            match interface.ssid_lossy() {
                Some(ssid) => println!("  ssid: {}", ssid),
                None => println!("  ssid: (not associated)"),
            }
            match (interface.signal_dbm, interface.signal_quality(), interface.signal_tier()) {
                (Some(dbm), Some(quality), Some(tier)) => {
                    println!("  signal: {} dBm ({}%, {:?})", dbm, quality, tier);
                }
                _ => println!("  signal: unknown"),
            }
        }
        println!();
    }
    Ok(())
}

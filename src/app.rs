use crossbeam_channel::{bounded, Receiver};
use radeontop::{DeviceInfo, DeviceInfoList, GpuMonitor, MonitorResult};
use std::io::{self, Write};
use std::{thread, time::Duration};

const MIB: f64 = 1024.0 * 1024.0;

// Terminal front end: polls on a sampler thread, prints on the caller's
pub struct App {
    receiver: Receiver<MonitorResult<DeviceInfoList>>,
    json: bool,
}

impl App {
    /// `count == 0` keeps polling until the receiver goes away.
    pub fn new(monitor: Box<dyn GpuMonitor>, interval: Duration, count: u64, json: bool) -> Self {
        let (sender, receiver) = bounded(1);

        thread::spawn(move || {
            let mut polls = 0;
            loop {
                if sender.send(monitor.device_info_list()).is_err() {
                    break;
                }
                polls += 1;
                if count != 0 && polls >= count {
                    break;
                }
                thread::sleep(interval);
            }
        });

        Self { receiver, json }
    }

    pub fn run(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut header_printed = self.json;

        for result in self.receiver.iter() {
            match result {
                Ok(list) => {
                    if !header_printed && !list.is_empty() {
                        write_header(&mut out, &list)?;
                        header_printed = true;
                    }
                    self.render(&mut out, &list)?;
                }
                // already reported by the monitor's observer; try again next tick
                Err(_) => continue,
            }
            out.flush()?;
        }
        Ok(())
    }

    fn render(&self, out: &mut impl Write, list: &DeviceInfoList) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut *out, list)?;
            return writeln!(out);
        }

        if list.is_empty() {
            return writeln!(out, "no AMD GPUs found");
        }
        for device in list.iter() {
            writeln!(out, "{}", status_line(device))?;
        }
        Ok(())
    }
}

// Printed once, before the first snapshot that has devices
fn write_header(out: &mut impl Write, list: &DeviceInfoList) -> io::Result<()> {
    for device in list.iter() {
        writeln!(
            out,
            "Monitoring GPU: {} [{}] (Driver: {}, PCI: {})",
            device.name,
            device.device_id,
            device.driver.as_deref().unwrap_or("unknown"),
            device.pci_slot.as_deref().unwrap_or("unknown"),
        )?;
    }
    Ok(())
}

fn status_line(device: &DeviceInfo) -> String {
    let stats = &device.stats;
    format!(
        "{} | GPU: {}% | VRAM: {:.1}/{:.1} MiB ({:.1}%) | Edge: {:.1}°C | Junction: {:.1}°C | Mem: {:.1}°C | Fan: {:.0} RPM | Power: {:.1} W | SCLK: {} | MCLK: {}",
        device.name,
        stats.gpu_usage,
        stats.vram_used as f64 / MIB,
        stats.vram_total as f64 / MIB,
        stats.memory_usage(),
        stats.temp_edge,
        stats.temp_junction,
        stats.temp_mem,
        stats.fan_rpm,
        stats.power_watts,
        clock(stats.gpu_clock_mhz),
        clock(stats.memory_clock_mhz),
    )
}

fn clock(mhz: Option<u32>) -> String {
    mhz.map_or_else(|| "N/A".to_string(), |v| format!("{v} MHz"))
}

slint::include_modules!();

mod config;

use anyhow::{bail, Result};
use melscope_core::{SerialConfig, SerialEvent, SerialService};
use melscope_decode::{FrameExtractor, FrameOutcome};
use slint::Model;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = config::load(config_path.as_deref())?;
    let band_count = cfg.bands.len();

    let app = MainWindow::new()?;

    let levels = Rc::new(slint::VecModel::from(vec![0.0f32; band_count]));
    app.set_levels(levels.clone().into());

    let labels: Vec<slint::SharedString> =
        cfg.bands.iter().map(|&hz| format_band(hz).into()).collect();
    app.set_labels(Rc::new(slint::VecModel::from(labels)).into());

    let service = Rc::new(SerialService::open(SerialConfig {
        port_name: cfg.port.clone(),
        baud_rate: cfg.baud_rate,
    })?);
    app.set_status(link_status(service.config()).into());

    let extractor = Rc::new(RefCell::new(FrameExtractor::new(band_count, cfg.encoding)));
    let fatal: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let skipped = Rc::new(Cell::new(0u64));

    // Poll-and-render tick: drain whatever arrived since the last tick,
    // apply only the newest reading. Zero readings leaves the chart as-is.
    let app_weak = app.as_weak();
    let service_tick = service.clone();
    let extractor_tick = extractor.clone();
    let fatal_tick = fatal.clone();
    let levels_tick = levels.clone();
    let skipped_tick = skipped.clone();

    let timer = slint::Timer::default();
    timer.start(
        slint::TimerMode::Repeated,
        std::time::Duration::from_millis(cfg.tick_ms),
        move || {
            let app = app_weak.unwrap();
            let mut latest: Option<Vec<f32>> = None;

            while let Ok(event) = service_tick.events().try_recv() {
                match event {
                    SerialEvent::Rx(data) => {
                        for outcome in extractor_tick.borrow_mut().ingest(&data) {
                            match outcome {
                                FrameOutcome::Reading(values) => latest = Some(values),
                                FrameOutcome::Rejected(err) => {
                                    skipped_tick.set(skipped_tick.get() + 1);
                                    app.set_status(
                                        format!("skipped frame: {err} ({} total)", skipped_tick.get())
                                            .into(),
                                    );
                                }
                            }
                        }
                    }
                    SerialEvent::Opened(port) => {
                        app.set_status(format!("listening on {port}").into());
                    }
                    SerialEvent::Error(e) => {
                        *fatal_tick.borrow_mut() = Some(e);
                        let _ = slint::quit_event_loop();
                        return;
                    }
                    SerialEvent::Closed => {}
                }
            }

            if let Some(values) = latest {
                for (i, value) in values.into_iter().enumerate() {
                    levels_tick.set_row_data(i, value);
                }
            }
        },
    );

    app.run()?;
    service.close();

    if let Some(e) = fatal.borrow_mut().take() {
        bail!("serial link failed: {e}");
    }
    Ok(())
}

fn link_status(link: &SerialConfig) -> String {
    format!("opening {} @ {} baud", link.port_name, link.baud_rate)
}

fn format_band(hz: f32) -> String {
    if hz >= 1000.0 {
        let k = hz / 1000.0;
        if k.fract() == 0.0 {
            format!("{}k", k as u32)
        } else {
            format!("{k:.1}k")
        }
    } else {
        format!("{}", hz as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::{format_band, link_status};
    use melscope_core::SerialConfig;

    #[test]
    fn band_labels_abbreviate_kilohertz() {
        assert_eq!(format_band(60.0), "60");
        assert_eq!(format_band(650.0), "650");
        assert_eq!(format_band(1000.0), "1k");
        assert_eq!(format_band(4500.0), "4.5k");
        assert_eq!(format_band(8000.0), "8k");
    }

    #[test]
    fn status_line_reports_the_link_settings() {
        let status = link_status(&SerialConfig {
            port_name: "/dev/ttyUSB0".into(),
            baud_rate: 115_200,
        });
        assert_eq!(status, "opening /dev/ttyUSB0 @ 115200 baud");
    }
}

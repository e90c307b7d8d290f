use log::info;
use skybatch::dataid::{DataId, TaskNeeds};
use skybatch::driver::{ProcessResult, cfht_main_from, lsst_sim_main_from};
use skybatch::repo::Repository;

use std::ffi::OsString;

/// Logs the header of one raw exposure: the stage run by the report task.
fn report(in_repo: &dyn Repository, _out_repo: &dyn Repository, data_id: &DataId) -> ProcessResult {
    let header = in_repo.get_header("raw", data_id)?;

    let psf = match header.psf() {
        Some(psf) => format!("{} fwhm={:.2}", psf.model, psf.fwhm),
        None => "none".to_string(),
    };
    let size = match header.dimensions {
        Some((w, h)) => format!("{}x{}", w, h),
        None => "no pixel file".to_string(),
    };
    info!(
        "{}: filter={} exptime={}s obs={} psf={} size={}",
        data_id, header.info.filter, header.info.exptime, header.info.obs_date, psf, size
    );
    Ok(())
}

fn usage() -> ! {
    eprintln!("usage: skybatch <cfht|lsst-sim> [options]");
    eprintln!("Reports raw exposures that have no processed calexp yet (-f for all).");
    std::process::exit(2);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")?.start()?;

    let mut argv: Vec<OsString> = std::env::args_os().collect();
    if argv.len() < 2 {
        usage();
    }
    let camera = argv.remove(1);

    let processed = match camera.to_str() {
        Some("cfht") => {
            let needs = TaskNeeds {
                amp: true,
                ..TaskNeeds::default()
            };
            cfht_main_from(argv, report, "calexp", &needs, ".")?
        }
        Some("lsst-sim") => {
            let needs = TaskNeeds {
                snap: true,
                channel: true,
                ..TaskNeeds::default()
            };
            lsst_sim_main_from(argv, report, "calexp", &needs, ".")?
        }
        _ => usage(),
    };

    info!("Reported {} exposures", processed);
    Ok(())
}

//! Integration tests for gview
//!
//! These tests drive a `Session` through its command interpreter against
//! FITS files written at test time.

use gview::{
    AppConfig, AstroImage, PlotData, Session,
    config::load_config_file,
    fits::{Header, HeaderValue, write_fits},
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

const WIDTH: usize = 64;
const HEIGHT: usize = 64;
/// Star center in data (0-based) coordinates.
const STAR: (f64, f64) = (30.0, 33.0);
const SIGMA: f64 = 2.5;

fn star_pixels() -> Vec<f64> {
    let mut data = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let r2 = (x as f64 - STAR.0).powi(2) + (y as f64 - STAR.1).powi(2);
            let noise = ((x * 7 + y * 13) % 5) as f64;
            data.push(100.0 + 1000.0 * (-r2 / (2.0 * SIGMA * SIGMA)).exp() + noise);
        }
    }
    data
}

fn wcs_header() -> Header {
    let mut h = Header::new();
    h.set("OBJECT", HeaderValue::Str("TEST STAR".into()), Some("target"));
    h.set("CTYPE1", HeaderValue::Str("RA---TAN".into()), None);
    h.set("CTYPE2", HeaderValue::Str("DEC--TAN".into()), None);
    h.set("CRPIX1", HeaderValue::Float(32.0), None);
    h.set("CRPIX2", HeaderValue::Float(32.0), None);
    h.set("CRVAL1", HeaderValue::Float(150.0), None);
    h.set("CRVAL2", HeaderValue::Float(2.0), None);
    h.set("CD1_1", HeaderValue::Float(-5.0e-5), None);
    h.set("CD1_2", HeaderValue::Float(0.0), None);
    h.set("CD2_1", HeaderValue::Float(0.0), None);
    h.set("CD2_2", HeaderValue::Float(5.0e-5), None);
    h.set("EQUINOX", HeaderValue::Float(2000.0), None);
    h
}

fn write_star(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    write_fits(&path, &wcs_header(), WIDTH, HEIGHT, &star_pixels()).expect("write fixture");
    path
}

/// A session whose working directory is a fresh temp dir holding `star.fits`.
fn session_in_tempdir() -> (Session, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    write_star(dir.path(), "star.fits");
    let mut session = Session::default();
    session.exec_cmd(&format!("cd {}", dir.path().display()));
    (session, dir)
}

fn lines(session: &Session) -> Vec<String> {
    session.history().lines().map(str::to_string).collect()
}

fn last(session: &Session) -> String {
    session.history().last().unwrap_or_default().to_string()
}

// ============================================================================
// Buffer Commands
// ============================================================================

mod buffer_tests {
    use super::*;

    #[test]
    fn test_rd_relative_path() {
        let (mut session, dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");

        let lines = lines(&session);
        let expected = dir.path().canonicalize().unwrap().join("star.fits");
        assert!(lines.contains(&format!("Reading file...({})", expected.display())));
        assert_eq!(lines.last().map(String::as_str), Some("File read"));

        let image = session.buffer("star").expect("buffer created");
        assert_eq!((image.width(), image.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_rd_reuse_warns() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("rd star star.fits");
        assert!(lines(&session)
            .iter()
            .any(|l| l == "Buffer star is in use. Will discard the previous data"));
        assert_eq!(session.buffers().len(), 1);
    }

    #[test]
    fn test_rd_missing_file() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd x nofile.fits");
        assert!(last(&session).starts_with("!! Error executing 'rd x nofile.fits': "));
        assert!(session.buffer("x").is_none());
    }

    #[test]
    fn test_head_keywords() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("head star CTYPE1 OBJECT");
        let lines = lines(&session);
        assert_eq!(lines[lines.len() - 2], "CTYPE1    RA---TAN");
        assert_eq!(lines[lines.len() - 1], "OBJECT    TEST STAR");

        session.exec_cmd("head star");
        assert!(lines_after_last_prompt(&session)
            .iter()
            .any(|l| l.starts_with("NAXIS1    64")));
    }

    #[test]
    fn test_lsb_and_rmb() {
        let (mut session, dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("lsb");
        let path = dir.path().canonicalize().unwrap().join("star.fits");
        assert_eq!(
            last(&session),
            format!("{:<10}  {:>13}  {}", "star", "64x64", path.display())
        );

        session.exec_cmd("rmb star ghost");
        let lines = lines(&session);
        assert_eq!(lines[lines.len() - 2], "No such buffer: 'ghost'");
        assert_eq!(last(&session), "No buffers");
    }

    #[test]
    fn test_stat_region() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        // A single pixel at the star center (FITS coordinates are 1-based).
        session.exec_cmd("stat star 31 34 31 34");
        let line = last(&session);
        assert!(line.starts_with("npix: 1  "), "{line}");
        assert!(line.contains("stddev: 0.0000"), "{line}");

        session.exec_cmd("stat star 0 1 2 2");
        assert!(last(&session).starts_with("!! Error executing 'stat star 0 1 2 2'"));
    }

    #[test]
    fn test_wf_round_trip() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("wf star copy.fits");
        assert!(last(&session).starts_with("Wrote "));
        session.exec_cmd("rd copy copy.fits");

        session.exec_cmd("stat star");
        let original = last(&session);
        session.exec_cmd("stat copy");
        assert_eq!(last(&session), original);

        session.exec_cmd("head copy OBJECT");
        assert_eq!(last(&session), "OBJECT    TEST STAR");
    }

    fn lines_after_last_prompt(session: &Session) -> Vec<String> {
        let lines = lines(session);
        let start = lines
            .iter()
            .rposition(|l| l.starts_with("ZVIEW> "))
            .map_or(0, |i| i + 1);
        lines[start..].to_vec()
    }
}

// ============================================================================
// Directory Commands
// ============================================================================

mod directory_tests {
    use super::*;

    #[test]
    fn test_cd_and_pwd() {
        let (mut session, dir) = session_in_tempdir();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(session.cwd(), canonical);
        session.exec_cmd("pwd");
        assert_eq!(last(&session), canonical.display().to_string());

        session.exec_cmd("cd does-not-exist");
        assert!(last(&session).starts_with("!! Error executing 'cd does-not-exist'"));
        assert_eq!(session.cwd(), canonical);
    }

    #[cfg(unix)]
    #[test]
    fn test_ls_runs_in_session_directory() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("ls");
        assert_eq!(last(&session), "star.fits");
    }
}

// ============================================================================
// Viewer Commands and Pick Keys
// ============================================================================

mod viewer_tests {
    use super::*;

    #[test]
    fn test_v_readout_uses_fits_coordinates() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("v star");
        let viewer = session.current_viewer_mut().unwrap();
        viewer.set_cursor(STAR.0, STAR.1);
        let readout = viewer.readout().unwrap();
        assert!(readout.starts_with("RA: "), "{readout}");
        assert!(readout.contains("X: 31.00  Y: 34.00"), "{readout}");
        assert!(!readout.contains("BAD WCS"), "{readout}");
    }

    #[test]
    fn test_pick_reports_seeing() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("v star");
        session.exec_cmd("pick 32 33");

        let lines = lines(&session);
        let seeing = lines
            .iter()
            .find_map(|l| l.strip_prefix("seeing size"))
            .expect("seeing line");
        let seeing: f64 = seeing.trim().parse().unwrap();
        // FWHM = 2.3548 * sigma pixels at 0.18 arcsec per pixel.
        let expected = 2.354_82 * SIGMA * 0.18;
        assert!((seeing - expected).abs() < 0.1, "seeing {seeing}, expected {expected}");
    }

    #[test]
    fn test_pick_on_blank_sky() {
        let dir = TempDir::new().unwrap();
        let flat = vec![10.0; WIDTH * HEIGHT];
        write_fits(&dir.path().join("flat.fits"), &Header::new(), WIDTH, HEIGHT, &flat).unwrap();

        let mut session = Session::default();
        session.exec_cmd(&format!("cd {}", dir.path().display()));
        session.exec_cmd("rd flat flat.fits");
        session.exec_cmd("v flat");
        session.exec_cmd("pick");
        assert!(last(&session).starts_with("!! Error executing 'pick': "));

        session.radial_plot();
        assert_eq!(last(&session), "No objects found");
        // Contours fall back to the cursor position.
        session.contour_plot();
        assert!(matches!(session.plot(), Some(PlotData::Contour(_))));
    }

    #[test]
    fn test_open_files_from_command_line() {
        let dir = TempDir::new().unwrap();
        let a = write_star(dir.path(), "a.fits");
        let b = write_star(dir.path(), "b.fits");

        let mut session = Session::default();
        session.open_file(&a).unwrap();
        session.open_file(&b).unwrap();
        let names: Vec<_> = session.viewers().keys().cloned().collect();
        assert_eq!(names, ["gview_0", "gview_1"]);
        assert_eq!(session.current_viewer_name(), Some("gview_0"));
        assert!(session.viewer("gview_1").unwrap().image().is_some());
        assert!(session.open_file(&dir.path().join("missing.fits")).is_err());
    }

    #[test]
    fn test_render_after_commands() {
        let (mut session, _dir) = session_in_tempdir();
        session.exec_cmd("rd star star.fits");
        session.exec_cmd("v star 100 1100 heat");
        session.exec_cmd("dist log");
        session.exec_cmd("zoom 0");

        let viewer = session.current_viewer().unwrap();
        let rgb = viewer.render(64, 64);
        assert_eq!(rgb.pixels.len(), 64 * 64);
        // The star is brighter than the corner in every channel sum.
        let sum = |p: [u8; 3]| p.iter().map(|&c| u32::from(c)).sum::<u32>();
        let center = rgb.get(32, 32).unwrap();
        let corner = rgb.get(0, 63).unwrap();
        assert!(sum(center) > sum(corner));
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_config_file_drives_new_viewers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gview.yaml");
        std::fs::write(
            &path,
            "viewer:\n  color_map: heat\n  color_dist: sqrt\n  autocut: minmax\nhistory:\n  timestamps: false\n",
        )
        .unwrap();
        let config: AppConfig = load_config_file(&path).unwrap();

        let mut session = Session::new(config);
        session.exec_cmd("mkv main");
        let viewer = session.current_viewer().unwrap();
        assert_eq!(viewer.color_map_name(), "heat");
        assert_eq!(viewer.color_algorithm().as_str(), "sqrt");
        assert_eq!(viewer.autocut_method().as_str(), "minmax");

        // Timestamps are off, so the plot echo is logged verbatim.
        session.radial_plot();
        assert!(session.history().lines().any(|l| l == "ZVIEW> (radial plot)"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gview.yaml");
        std::fs::write(&path, "viewer:\n  color_map: nosuchmap\n").unwrap();
        assert!(load_config_file(&path).is_err());
    }

    #[test]
    fn test_minmax_autocut_on_load() {
        let dir = TempDir::new().unwrap();
        let path = write_star(dir.path(), "star.fits");
        let image = AstroImage::load_file(&path).unwrap();
        let mut config = AppConfig::default();
        config.viewer.autocut = "minmax".into();

        let mut session = Session::new(config);
        session.open_file(&path).unwrap();
        let (lo, hi) = session.current_viewer().unwrap().cuts();
        let stats = image.statistics(None).unwrap();
        assert_eq!((lo, hi), (stats.min, stats.max));
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use approx::assert_relative_eq;
    use pendulum_control::analysis::AnalysisParams;
    use pendulum_control::cli::analyze::{run_analysis, run_diagnostics, run_sweep};
    use pendulum_control::core::file_io::FilePrefix;

    fn small_reference_params() -> AnalysisParams {
        let mut params: AnalysisParams = serde_json::from_str(
            &std::fs::read_to_string("params/pendulum/reference.json").unwrap(),
        )
        .unwrap();
        params.plot.width = 320;
        params.plot.height = 240;
        params.model.final_time = 1.0;
        params.root_locus.gain_count = 60;
        params.frequency_grid.count = 500;
        params
    }

    fn file_prefix(directory: &Path) -> FilePrefix {
        FilePrefix {
            directory_path: directory.to_path_buf(),
            file_base: "reference".to_owned(),
        }
    }

    fn files_matching(directory: &Path, pattern: &str) -> usize {
        let pattern = directory.join(pattern);
        glob::glob(pattern.to_str().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .count()
    }

    fn read_summary(directory: &Path) -> serde_json::Value {
        let text = std::fs::read_to_string(directory.join("reference_summary.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_analysis_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        run_analysis(&small_reference_params(), file_prefix(dir.path())).unwrap();

        for suffix in [
            "_root_locus_plant.png",
            "_root_locus_loop.png",
            "_nyquist.png",
            "_step.png",
            "_sweep.png",
        ] {
            let path = dir.path().join(format!("reference{}", suffix));
            let image = image::open(&path).unwrap();
            assert_eq!((image.width(), image.height()), (320, 240), "{}", suffix);
        }
        assert_eq!(files_matching(dir.path(), "reference_mass_*.csv"), 3);
        assert!(dir.path().join("reference.json").exists());

        let summary = read_summary(dir.path());
        let gains = &summary["design"]["pid_gains"];
        assert_relative_eq!(gains["kp"].as_f64().unwrap(), 6.0, epsilon = 1e-12);
        assert_eq!(gains["ki"].as_f64().unwrap(), 0.0);
        assert_relative_eq!(gains["kd"].as_f64().unwrap(), 0.8, epsilon = 1e-12);
        assert_eq!(
            summary["diagnostics"]["nyquist"]["closed_loop_rhp_poles"].as_i64(),
            Some(0)
        );
        assert_eq!(summary["sweep"].as_array().unwrap().len(), 3);

        let stages = std::fs::read_to_string(dir.path().join("reference_diagnostics.txt")).unwrap();
        for stage in [
            "build linear models",
            "compute diagnostics",
            "plot diagnostics",
            "simulate mass sweep",
            "write result tables",
            "plot sweep",
            "write summary",
        ] {
            assert!(stages.contains(stage), "missing stage {}", stage);
        }
    }

    #[test]
    fn test_diagnostics_command_skips_the_sweep() {
        let dir = tempfile::tempdir().unwrap();
        run_diagnostics(&small_reference_params(), file_prefix(dir.path())).unwrap();

        assert!(dir.path().join("reference_nyquist.png").exists());
        assert!(!dir.path().join("reference_sweep.png").exists());
        assert_eq!(files_matching(dir.path(), "reference_mass_*.csv"), 0);

        let summary = read_summary(dir.path());
        assert!(summary["diagnostics"].is_object());
        assert!(summary.get("sweep").is_none());
    }

    #[test]
    fn test_sweep_command_without_plots() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = small_reference_params();
        params.plot.enabled = false;
        run_sweep(&params, file_prefix(dir.path())).unwrap();

        assert_eq!(files_matching(dir.path(), "reference_*.png"), 0);
        assert_eq!(files_matching(dir.path(), "reference_mass_*.csv"), 3);

        let summary = read_summary(dir.path());
        assert!(summary.get("diagnostics").is_none());
        let stages = std::fs::read_to_string(dir.path().join("reference_diagnostics.txt")).unwrap();
        assert!(stages.contains("simulate mass sweep"));
        assert!(!stages.contains("plot sweep"));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pendulum_control::analysis::{compute_diagnostics, AnalysisParams, ControlDesign};
    use pendulum_control::control::compensator::CompensatorParams;

    fn reference_params() -> AnalysisParams {
        serde_json::from_str(&std::fs::read_to_string("params/pendulum/reference.json").unwrap())
            .unwrap()
    }

    #[test]
    fn test_reference_design_is_stable() {
        let params = reference_params();
        let design = ControlDesign::new(&params.physical, &params.compensator);
        let diagnostics = compute_diagnostics(&design, &params);

        let stability = diagnostics.stability.unwrap();
        assert_eq!(stability.open_loop_rhp_poles, 1);
        assert_eq!(stability.clockwise_encirclements, -1);
        assert_eq!(stability.closed_loop_rhp_poles, 0);
        assert!(design.closed_loop.poles().iter().all(|p| p.re < 0.0));

        let step = diagnostics.step.unwrap();
        assert_eq!(step.time.len(), step.output.len());
        assert_relative_eq!(
            *step.output.last().unwrap(),
            design.closed_loop.dc_gain(),
            max_relative = 0.02
        );
    }

    #[test]
    fn test_root_locus_starts_at_open_loop_poles() {
        let params = reference_params();
        let design = ControlDesign::new(&params.physical, &params.compensator);
        let diagnostics = compute_diagnostics(&design, &params);

        for locus in [&diagnostics.plant_locus, &diagnostics.loop_locus] {
            assert_eq!(locus.gains[0], 0.0);
            assert_eq!(locus.gains.len(), params.root_locus.gain_count + 1);
            for branch in &locus.branches {
                let start = branch[0];
                assert!(locus
                    .open_loop_poles
                    .iter()
                    .any(|pole| (pole - start).norm() < 1e-6));
            }
        }
    }

    #[test]
    fn test_weak_compensator_is_unstable() {
        let mut params = reference_params();
        params.compensator = CompensatorParams {
            gain: 0.5,
            ..params.compensator
        };
        let design = ControlDesign::new(&params.physical, &params.compensator);
        let diagnostics = compute_diagnostics(&design, &params);

        let stability = diagnostics.stability.unwrap();
        assert_eq!(stability.closed_loop_rhp_poles, 1);
        assert!(!stability.is_closed_loop_stable());
        assert_eq!(
            design.closed_loop.poles().iter().filter(|p| p.re > 0.0).count(),
            1
        );
    }
}

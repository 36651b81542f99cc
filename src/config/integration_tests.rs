#[cfg(test)]
mod integration_tests {
    use crate::config::{
        load_and_validate_config, load_config, DistributionPolicy, HopKind, MergePolicy,
        RuntimeBuilder,
    };
    use crate::engine::{FailureKind, StepState};
    use crate::errors::{EngineError, StopMode};
    use std::io::Write;

    /// Test that the linear sample graph loads and runs to completion
    #[tokio::test]
    async fn test_linear_yaml_runs_end_to_end() {
        let graph = load_and_validate_config("configs/linear.yaml").unwrap();

        assert_eq!(graph.run_options().buffer_size, 100);
        assert_eq!(graph.run_options().checkpoint_interval, 250);
        assert_eq!(graph.step("spread").unwrap().copies, 2);
        assert!(graph.is_source("numbers"));

        let cfg = load_config("configs/linear.yaml").unwrap();
        let (graph, launcher) = RuntimeBuilder::from_config(&cfg).unwrap();
        let result = launcher.execute(&graph).await.unwrap();

        assert!(result.success, "{:?}", result.failure);
        assert_eq!(result.step("numbers").unwrap().lines_written, 1000);
        assert_eq!(result.step("spread").unwrap().lines_read, 1000);
        assert_eq!(result.step("log").unwrap().lines_read, 1000);
        assert!(result.steps.iter().all(|step| step.state == StepState::Done));
    }

    /// Test that bad rows from the sample graph land on the error hop
    #[tokio::test]
    async fn test_error_routing_yaml() {
        let cfg = load_config("configs/error-routing.yaml").unwrap();
        let (graph, launcher) = RuntimeBuilder::from_config(&cfg).unwrap();

        let error_hops: Vec<_> = graph
            .hops()
            .iter()
            .filter(|hop| hop.kind == HopKind::Error)
            .collect();
        assert_eq!(error_hops.len(), 1);
        assert_eq!(error_hops[0].from, "check_amount");
        assert_eq!(error_hops[0].to, "rejects");

        let result = launcher.execute(&graph).await.unwrap();

        assert!(result.success, "{:?}", result.failure);
        let check = result.step("check_amount").unwrap();
        assert_eq!(check.lines_read, 5);
        assert_eq!(check.lines_written, 3);
        assert_eq!(check.lines_rejected, 2);
        assert_eq!(result.step("accepted").unwrap().lines_read, 3);
        assert_eq!(result.step("rejects").unwrap().lines_read, 2);
    }

    /// Test that TOML graphs are accepted and priority merge keeps tier order
    #[tokio::test]
    async fn test_priority_merge_toml() {
        let cfg = load_config("configs/priority-merge.toml").unwrap();
        assert!(cfg.run.safe_mode);
        assert_eq!(cfg.steps.len(), 4);

        let (graph, launcher) = RuntimeBuilder::from_config(&cfg).unwrap();
        let result = launcher.execute(&graph).await.unwrap();

        assert!(result.success, "{:?}", result.failure);
        assert_eq!(result.step("ordered").unwrap().lines_read, 8);
        assert_eq!(result.step("out").unwrap().lines_read, 8);
    }

    #[test]
    fn test_invalid_graph_reports_every_problem() {
        let yaml = r#"
steps:
  - id: a
    type: pass_through
    copies: 0
  - id: a
    type: pass_through
hops:
  - { from: a, to: missing }
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let err = load_and_validate_config(file.path()).err().unwrap().to_string();
        assert!(err.contains("Configuration validation failed"), "{}", err);
        assert!(err.contains("missing"), "{}", err);
        assert!(err.contains("'a'"), "{}", err);

        let cfg = load_config(file.path()).unwrap();
        match RuntimeBuilder::from_config(&cfg) {
            Err(EngineError::Validation(errors)) => assert!(errors.len() >= 3),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("graph should not validate"),
        }
    }

    #[tokio::test]
    async fn test_unknown_step_type_fails_launch() {
        let yaml = r#"
steps:
  - id: mystery
    type: teleporter
"#;
        let cfg = serde_yaml::from_str(yaml).unwrap();
        let (graph, launcher) = RuntimeBuilder::from_config(&cfg).unwrap();

        match launcher.execute(&graph).await {
            Err(EngineError::Registry(err)) => assert!(err.to_string().contains("teleporter")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("unknown step type should fail the launch"),
        }
    }

    #[tokio::test]
    async fn test_yaml_run_options_drive_the_run() {
        let yaml = r#"
run:
  on_error: safe
steps:
  - id: numbers
    type: row_generator
    distribution: copy
    options: { never_ending: true }
  - id: tripwire
    type: abort
    merge: round_robin
    options: { after_rows: 3, message: "stop here" }
  - id: keep
    type: pass_through
    copies: 2
    distribution: clone
hops:
  - { from: numbers, to: tripwire }
  - { from: numbers, to: keep }
"#;
        let cfg = serde_yaml::from_str(yaml).unwrap();
        let (graph, launcher) = RuntimeBuilder::from_config(&cfg).unwrap();
        assert_eq!(graph.distribution_of("keep"), DistributionPolicy::Clone);
        assert_eq!(graph.step("tripwire").unwrap().merge, Some(MergePolicy::RoundRobin));

        let result = launcher.execute(&graph).await.unwrap();

        let failure = result.failure.clone().unwrap();
        assert_eq!(failure.kind, FailureKind::Engine);
        assert_eq!(failure.message, "stop here");
        assert_eq!(result.stop_mode, Some(StopMode::Safe));
        let keep = result.step("keep").unwrap();
        assert_eq!(keep.copies, 2);
        assert_eq!(keep.state, StepState::Done);
    }
}

use clap::Parser;
use std::collections::HashMap;
use tomodo_cli::{Cli, CliError, CommandHandler, Commands, OutputFormat, ShellArg, TomodoConfig};
use tomodo_docker::{DockerError, ExecOutput, MockContainerEngine, Shell};
use tomodo_types::{
    ContainerRef, ContainerState, LABEL_DEPLOYMENT_NAME, LABEL_DEPLOYMENT_TYPE, LABEL_PORT,
    LABEL_ROLE, LABEL_SOURCE, LABEL_VERSION, SOURCE_TOMODO,
};

fn container(id: &str, name: &str, labels: &[(&str, &str)]) -> ContainerRef {
    let mut all: HashMap<String, String> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    all.insert(LABEL_SOURCE.to_string(), SOURCE_TOMODO.to_string());
    ContainerRef::new(id, name, all, ContainerState::Running)
}

fn standalone(version: &str) -> ContainerRef {
    container(
        "aa11bb22cc33dd44",
        "unit-test-sa",
        &[
            (LABEL_DEPLOYMENT_NAME, "unit-test-sa"),
            (LABEL_DEPLOYMENT_TYPE, "standalone"),
            (LABEL_VERSION, version),
        ],
    )
}

fn handler(engine: MockContainerEngine) -> CommandHandler<MockContainerEngine> {
    let mut config = TomodoConfig::default();
    config.retry.max_attempts = 2;
    config.retry.delay_seconds = 0;
    CommandHandler::new(engine, config)
}

#[test]
fn test_parse_stop_with_name() {
    let cli = Cli::try_parse_from(["tomodo", "stop", "unit-test-sa"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Stop {
            name: Some("unit-test-sa".to_string()),
            all: false
        }
    );
    assert_eq!(cli.format, OutputFormat::Table);
}

#[test]
fn test_parse_remove_requires_name_or_all() {
    assert!(Cli::try_parse_from(["tomodo", "remove"]).is_err());
    assert!(Cli::try_parse_from(["tomodo", "remove", "x", "--all"]).is_err());

    let cli = Cli::try_parse_from(["tomodo", "--data-root", "/srv/data", "remove", "--all"]).unwrap();
    assert_eq!(cli.command, Commands::Remove { name: None, all: true });
    assert_eq!(cli.data_root.unwrap().to_str(), Some("/srv/data"));
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["tomodo", "list", "--filter", "tomodo-type=sharded", "-v", "--format", "json"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.format, OutputFormat::Json);
    assert_eq!(
        cli.command,
        Commands::List {
            filter: Some("tomodo-type=sharded".to_string())
        }
    );
    assert!(Cli::try_parse_from(["tomodo", "-v", "-q", "list"]).is_err());
}

#[test]
fn test_parse_check_ports_and_eval() {
    let cli = Cli::try_parse_from(["tomodo", "check-ports", "27017", "27018"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::CheckPorts {
            ports: vec![27017, 27018],
            host: "localhost".to_string()
        }
    );
    assert!(Cli::try_parse_from(["tomodo", "check-ports"]).is_err());
    assert!(Cli::try_parse_from(["tomodo", "check-ports", "70000"]).is_err());

    let cli = Cli::try_parse_from(["tomodo", "eval", "unit-test-sa", "db.version()", "--shell", "mongo", "--json"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Eval {
            name: "unit-test-sa".to_string(),
            command: "db.version()".to_string(),
            shell: Some(ShellArg::Mongo),
            json: true
        }
    );
}

#[tokio::test]
async fn test_list_applies_label_filter() {
    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_containers()
        .withf(|selector| {
            selector.to_filters()
                == vec!["source=tomodo", "tomodo-name", "tomodo-type=sharded"]
        })
        .times(1)
        .returning(|_| {
            Ok(vec![
                container("c1", "unit-test-sc-cfg", &[(LABEL_DEPLOYMENT_NAME, "unit-test-sc")]),
                container("c2", "unit-test-sc-mongos", &[(LABEL_DEPLOYMENT_NAME, "unit-test-sc")]),
            ])
        });

    let names = handler(engine).list(Some("tomodo-type=sharded")).await.unwrap();
    assert_eq!(names, vec!["unit-test-sc"]);
}

#[tokio::test]
async fn test_list_rejects_malformed_filter() {
    let engine = MockContainerEngine::new();
    let result = handler(engine).list(Some("tomodo-type")).await;
    assert!(matches!(result, Err(CliError::ModelError(_))));
}

#[tokio::test]
async fn test_describe_unknown_deployment() {
    let mut engine = MockContainerEngine::new();
    engine.expect_list_containers().returning(|_| Ok(Vec::new()));

    let result = handler(engine).describe("missing").await;
    assert!(matches!(result, Err(CliError::DeploymentNotFound(name)) if name == "missing"));
}

#[tokio::test]
async fn test_stop_reports_failures() {
    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_containers()
        .returning(|_| Ok(vec![standalone("7.0")]));
    engine
        .expect_get_container()
        .returning(|_| Ok(standalone("7.0")));
    engine
        .expect_stop_container()
        .times(1)
        .returning(|_| Err(DockerError::EngineUnavailable("connection reset".to_string())));

    let result = handler(engine).stop(Some("unit-test-sa".to_string()), false).await;
    assert!(matches!(result, Err(CliError::TeardownIncomplete(1))));
}

#[tokio::test]
async fn test_stop_without_name_or_all() {
    let result = handler(MockContainerEngine::new()).stop(None, false).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[tokio::test]
async fn test_eval_picks_shell_from_version_label() {
    let mut engine = MockContainerEngine::new();
    engine
        .expect_list_containers()
        .returning(|_| Ok(vec![standalone("4.4")]));
    engine
        .expect_get_container()
        .returning(|_| Ok(standalone("4.4")));
    engine
        .expect_exec()
        .withf(|_, cmd| cmd == ["which", "mongo"])
        .times(1)
        .returning(|_, _| {
            Ok(ExecOutput {
                exit_code: 0,
                output: "/usr/bin/mongo".to_string(),
            })
        });
    engine
        .expect_exec()
        .withf(|id, cmd| id == "aa11bb22cc33dd44" && cmd[0] == "mongo" && cmd[1] == "unit-test-sa")
        .times(1)
        .returning(|_, _| {
            Ok(ExecOutput {
                exit_code: 0,
                output: "2024-01-01T00:00:00.000+0000 I NETWORK connected\n4.4.18\n".to_string(),
            })
        });

    let output = handler(engine)
        .eval("unit-test-sa", "db.version()", None, false)
        .await
        .unwrap();
    assert_eq!(output.output, "4.4.18");
    assert_eq!(output.exit_code, 0);
}

#[tokio::test]
async fn test_eval_targets_router_of_sharded_cluster() {
    let mut engine = MockContainerEngine::new();
    let sharded = (LABEL_DEPLOYMENT_TYPE, "sharded");
    let name = (LABEL_DEPLOYMENT_NAME, "unit-test-sc");
    let members = vec![
        container("cfg0000000000001", "unit-test-sc-cfg-1", &[name, sharded, (LABEL_ROLE, "config-svr"), (LABEL_PORT, "27018")]),
        container("mgs0000000000001", "unit-test-sc-mongos-1", &[name, sharded, (LABEL_ROLE, "mongos"), (LABEL_PORT, "27017")]),
    ];
    let listed = members.clone();
    engine.expect_list_containers().returning(move |_| Ok(listed.clone()));
    engine
        .expect_get_container()
        .withf(|id| id == "mgs0000000000001")
        .times(1)
        .returning(move |_| Ok(members[1].clone()));
    engine
        .expect_exec()
        .withf(|_, cmd| cmd[0] == "which")
        .returning(|_, _| {
            Ok(ExecOutput {
                exit_code: 0,
                output: String::new(),
            })
        });
    engine
        .expect_exec()
        .withf(|_, cmd| cmd[0] == "mongosh")
        .returning(|_, cmd| {
            Ok(ExecOutput {
                exit_code: 0,
                output: cmd[5].clone(),
            })
        });

    let output = handler(engine)
        .eval("unit-test-sc", "sh.status()", Some(Shell::Mongosh), true)
        .await
        .unwrap();
    assert_eq!(output.container_id, "mgs0000000000001");
    assert_eq!(output.output, "JSON.stringify(sh.status())");
}

// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, env var resolution, discovery, and destination merging.

use berth::config::*;
use berth::error::Error;
use berth::types::{Protocol, ServicePort};
use std::path::PathBuf;
use std::time::Duration;

const MINIMAL: &str = r#"
workload: web
resource_group: my-rg
dns_prefix: mydcos
ssh: azureuser
manifests:
  - web.json
"#;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config_applies_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();

        assert_eq!(config.workload.as_str(), "web");
        assert_eq!(config.orchestrator, Orchestrator::Marathon);
        assert_eq!(config.cluster, "dcos");
        assert_eq!(config.subscription, None);
        assert_eq!(config.namespace, "default");
        assert!(config.substitute_variables);
        assert!(config.ports.is_empty());
        assert_eq!(config.ssh, SshConfig::new("azureuser"));
        assert_eq!(config.ssh.command_timeout, Duration::from_secs(300));
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
workload: /shop/web
orchestrator: k8s
resource_group: prod-rg
cluster: acs
dns_prefix: shopk8s
ssh:
  user: ops
  key: ~/.ssh/acs
  port: 2222
  trust_first_connection: true
  command_timeout: 90s
manifests:
  - deploy/web.yaml
  - deploy/worker.yaml
namespace: shop
substitute_variables: false
ports:
  - 8080
  - "8443:443"
  - "53/udp"
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.workload.as_str(), "shop/web");
        assert_eq!(config.orchestrator, Orchestrator::Kubernetes);
        assert_eq!(config.cluster, "acs");
        assert_eq!(config.ssh.user, "ops");
        assert_eq!(config.ssh.key, Some(PathBuf::from("~/.ssh/acs")));
        assert_eq!(config.ssh.port, Some(2222));
        assert!(config.ssh.trust_first_connection);
        assert_eq!(config.ssh.command_timeout, Duration::from_secs(90));
        assert_eq!(config.manifests.len(), 2);
        assert_eq!(
            config.ports,
            vec![
                ServicePort::new(8080, 8080, Protocol::Tcp),
                ServicePort::new(8443, 443, Protocol::Tcp),
                ServicePort::new(53, 53, Protocol::Udp),
            ]
        );
        assert_eq!(config.substitution_variables().unwrap(), None);
    }

    #[test]
    fn empty_manifest_list_is_rejected() {
        let yaml = r#"
workload: web
resource_group: my-rg
dns_prefix: mydcos
ssh: azureuser
manifests: []
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let yaml = format!("{MINIMAL}ports:\n  - \"0\"\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn invalid_workload_name_is_rejected() {
        let yaml = MINIMAL.replace("workload: web", "workload: Web_App");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn ssh_user_with_host_is_rejected() {
        let yaml = MINIMAL.replace("ssh: azureuser", "ssh: azureuser@host");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn unknown_orchestrator_is_rejected() {
        let yaml = format!("{MINIMAL}orchestrator: swarm\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }
}

mod variables {
    use super::*;

    fn with_variables(vars: &str) -> Config {
        Config::from_yaml(&format!("{MINIMAL}variables:\n{vars}")).unwrap()
    }

    #[test]
    fn literal_values_resolve_as_is() {
        let config = with_variables("  TAG: v1\n");
        let vars = config.substitution_variables().unwrap().unwrap();
        assert_eq!(vars.get("TAG").map(String::as_str), Some("v1"));
    }

    #[test]
    fn env_values_read_the_environment() {
        let config = with_variables("  TAG:\n    env: BERTH_TEST_TAG\n");
        temp_env::with_var("BERTH_TEST_TAG", Some("from_environment"), || {
            let vars = config.substitution_variables().unwrap().unwrap();
            assert_eq!(vars.get("TAG").map(String::as_str), Some("from_environment"));
        });
    }

    #[test]
    fn env_default_applies_when_unset() {
        let config = with_variables("  TAG:\n    env: BERTH_TEST_UNSET\n    default: latest\n");
        temp_env::with_var_unset("BERTH_TEST_UNSET", || {
            let vars = config.substitution_variables().unwrap().unwrap();
            assert_eq!(vars.get("TAG").map(String::as_str), Some("latest"));
        });
    }

    #[test]
    fn missing_env_without_default_is_an_error() {
        let config = with_variables("  TAG:\n    env: BERTH_TEST_REQUIRED\n");
        temp_env::with_var_unset("BERTH_TEST_REQUIRED", || {
            let err = config.substitution_variables().unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(ref v) if v == "BERTH_TEST_REQUIRED"));
        });
    }
}

mod destinations {
    use super::*;

    const WITH_DESTINATIONS: &str = r#"
workload: web
resource_group: dev-rg
dns_prefix: devdcos
ssh: azureuser
manifests:
  - web.json
ports:
  - 8080
variables:
  TAG: dev
  REPLICAS: "1"
destinations:
  production:
    resource_group: prod-rg
    subscription: prod-sub
    dns_prefix: proddcos
    ports:
      - 443
    variables:
      TAG: stable
"#;

    #[test]
    fn destination_overrides_and_merges() {
        let config = Config::from_yaml(WITH_DESTINATIONS).unwrap();
        let prod = config.for_destination("production").unwrap();

        assert_eq!(prod.resource_group, "prod-rg");
        assert_eq!(prod.subscription.as_deref(), Some("prod-sub"));
        assert_eq!(config.subscription, None);
        assert_eq!(prod.dns_prefix, "proddcos");
        assert_eq!(prod.ports, vec![ServicePort::new(443, 443, Protocol::Tcp)]);
        assert_eq!(prod.manifests.first(), &PathBuf::from("web.json"));

        let vars = prod.substitution_variables().unwrap().unwrap();
        assert_eq!(vars.get("TAG").map(String::as_str), Some("stable"));
        assert_eq!(vars.get("REPLICAS").map(String::as_str), Some("1"));
    }

    #[test]
    fn unknown_destination_is_an_error() {
        let config = Config::from_yaml(WITH_DESTINATIONS).unwrap();
        let err = config.for_destination("staging").unwrap_err();
        assert!(matches!(err, Error::UnknownDestination(ref d) if d == "staging"));
    }
}

mod discovery {
    use super::*;
    use std::fs;

    #[test]
    fn finds_primary_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.workload.as_str(), "web");
    }

    #[test]
    fn falls_back_to_dot_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".berth")).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_DIR), MINIMAL).unwrap();

        assert!(Config::discover(dir.path()).is_ok());
    }

    #[test]
    fn reports_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::discover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}

mod init {
    use super::*;

    #[test]
    fn writes_a_loadable_template() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("shop/web"), Some("marathon"), false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.workload.as_str(), "shop/web");
        assert_eq!(config.manifests.first(), &PathBuf::from("web.json"));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, None, false).unwrap();

        let err = init_config(dir.path(), None, None, false).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(init_config(dir.path(), None, None, true).is_ok());
    }
}

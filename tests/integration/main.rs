//! Integration tests for jvmcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the runner and user configuration
    fn jvmcache(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("jvmcache");
        cmd.env_remove("GITHUB_STATE")
            .env_remove("GITHUB_OUTPUT")
            .env_remove("GITHUB_PATH")
            .env_remove("INPUT_WORKSPACE")
            .env_remove("BORINGCACHE_DEFAULT_WORKSPACE")
            .env_remove("RUST_LOG")
            .env_remove("JVMCACHE_STATE_FILE")
            .env("JVMCACHE_CONFIG", dir.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        jvmcache(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("restore").and(predicate::str::contains("save")));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        jvmcache(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("jvmcache"));
    }

    #[test]
    fn save_without_session_is_noop() {
        let dir = TempDir::new().unwrap();
        jvmcache(&dir)
            .args(["save", "--state-file"])
            .arg(dir.path().join("session.json"))
            .assert()
            .success()
            .stdout(predicate::str::contains("No workspace found, skipping save"));
    }

    #[test]
    fn restore_requires_workspace() {
        let dir = TempDir::new().unwrap();
        jvmcache(&dir)
            .args(["restore", "--state-file"])
            .arg(dir.path().join("session.json"))
            .args(["--working-directory"])
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Workspace required"));
    }

    #[test]
    fn restore_failure_is_annotated_under_actions() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state");
        std::fs::write(&state, "").unwrap();

        jvmcache(&dir)
            .env("GITHUB_STATE", &state)
            .env("INPUT_WORKING-DIRECTORY", dir.path())
            .arg("restore")
            .assert()
            .failure()
            .stdout(predicate::str::contains("::error::Workspace required"));
    }

    #[test]
    fn save_under_actions_without_state_succeeds() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state");
        std::fs::write(&state, "").unwrap();

        jvmcache(&dir)
            .env("GITHUB_STATE", &state)
            .arg("save")
            .assert()
            .success()
            .stdout(predicate::str::contains("::warning::").not());
    }

    #[test]
    fn invalid_config_fails_restore_but_not_save() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[proxy\nhost = ").unwrap();
        let session = dir.path().join("session.json");

        jvmcache(&dir)
            .args(["restore", "--workspace", "myorg/app", "--state-file"])
            .arg(&session)
            .assert()
            .failure();

        jvmcache(&dir)
            .args(["save", "--state-file"])
            .arg(&session)
            .assert()
            .success()
            .stderr(predicate::str::contains("Save failed"));
    }

    #[cfg(unix)]
    #[test]
    fn save_stops_recorded_proxy_despite_invalid_config() {
        use std::os::unix::process::ExitStatusExt;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[proxy\nhost = ").unwrap();
        let mut proxy = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let session = dir.path().join("session.json");
        std::fs::write(
            &session,
            format!(r#"{{"workspace":"a/b","proxyPid":"{}"}}"#, proxy.id()),
        )
        .unwrap();

        jvmcache(&dir)
            .args(["save", "--state-file"])
            .arg(&session)
            .assert()
            .success()
            .stderr(predicate::str::contains("Save failed"))
            .stderr(predicate::str::contains("Invalid configuration"));

        let status = proxy.wait().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGTERM));
    }
}

mod lifecycle_tests {
    use async_trait::async_trait;
    use jvmcache::cache::{CacheCli, CacheOutput};
    use jvmcache::config::schema::ProxyConfig;
    use jvmcache::config::{Environment, RestoreInputs, SaveInputs};
    use jvmcache::host::JobHost;
    use jvmcache::lifecycle::{
        self, run_phase, Collaborators, FailurePolicy, PhaseOutcome, SaveReport,
    };
    use jvmcache::orchestration::{ProxyControl, ProxyHandle, ProxySettings, Toolchain};
    use jvmcache::project::BuildTool;
    use jvmcache::{JvmCacheError, JvmCacheResult};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeHost {
        state: Mutex<HashMap<String, String>>,
        outputs: Mutex<HashMap<String, String>>,
        paths: Mutex<Vec<PathBuf>>,
        failures: Mutex<Vec<String>>,
        warnings: Mutex<Vec<String>>,
    }

    impl FakeHost {
        /// Host for a save phase that continues `previous`'s session
        fn resume(previous: &FakeHost) -> Self {
            Self {
                state: Mutex::new(previous.state()),
                ..Self::default()
            }
        }

        fn with_state(pairs: &[(&str, &str)]) -> Self {
            let state = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Self {
                state: Mutex::new(state),
                ..Self::default()
            }
        }

        fn state(&self) -> HashMap<String, String> {
            self.state.lock().unwrap().clone()
        }

        fn outputs(&self) -> HashMap<String, String> {
            self.outputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobHost for FakeHost {
        fn get_state(&self, key: &str) -> Option<String> {
            self.state
                .lock()
                .unwrap()
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
        }

        async fn save_state(&self, key: &str, value: &str) -> JvmCacheResult<()> {
            self.state
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn set_output(&self, name: &str, value: &str) -> JvmCacheResult<()> {
            self.outputs
                .lock()
                .unwrap()
                .insert(name.to_string(), value.to_string());
            Ok(())
        }

        async fn add_path(&self, dir: &Path) -> JvmCacheResult<()> {
            self.paths.lock().unwrap().push(dir.to_path_buf());
            Ok(())
        }

        fn report_failure(&self, message: &str) {
            self.failures.lock().unwrap().push(message.to_string());
        }

        fn report_warning(&self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    struct FakeCache {
        ensured: Mutex<Vec<Option<String>>>,
        calls: Mutex<Vec<Vec<String>>>,
        restore_output: CacheOutput,
        fail_saves: bool,
    }

    impl FakeCache {
        fn new(restore_output: &str) -> Self {
            Self {
                ensured: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                restore_output: CacheOutput {
                    exit_code: 0,
                    output: restore_output.to_string(),
                },
                fail_saves: false,
            }
        }

        fn hit() -> Self {
            Self::new("")
        }

        fn miss() -> Self {
            Self::new("Cache miss")
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_of(&self, command: &str) -> Vec<Vec<String>> {
            self.calls()
                .into_iter()
                .filter(|args| args.first().map(String::as_str) == Some(command))
                .collect()
        }
    }

    #[async_trait]
    impl CacheCli for FakeCache {
        async fn ensure(&self, version: Option<&str>) -> JvmCacheResult<()> {
            self.ensured
                .lock()
                .unwrap()
                .push(version.map(str::to_string));
            Ok(())
        }

        async fn exec(&self, args: &[String]) -> JvmCacheResult<CacheOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            if args[0] == "save" && self.fail_saves {
                return Err(JvmCacheError::command_exit("boringcache save", 1));
            }
            Ok(self.restore_output.clone())
        }
    }

    struct FakeProxy {
        pid: u32,
        free_port: u16,
        ready: bool,
        started: Mutex<Vec<ProxySettings>>,
        waited: Mutex<Vec<(u16, Duration, u32)>>,
        stopped: Mutex<Vec<u32>>,
    }

    impl FakeProxy {
        fn new(pid: u32) -> Self {
            Self {
                pid,
                free_port: 41234,
                ready: true,
                started: Mutex::new(Vec::new()),
                waited: Mutex::new(Vec::new()),
                stopped: Mutex::new(Vec::new()),
            }
        }

        fn never_ready(pid: u32) -> Self {
            Self {
                ready: false,
                ..Self::new(pid)
            }
        }

        fn stopped(&self) -> Vec<u32> {
            self.stopped.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProxyControl for FakeProxy {
        async fn free_port(&self) -> JvmCacheResult<u16> {
            Ok(self.free_port)
        }

        async fn start(&self, settings: &ProxySettings) -> JvmCacheResult<ProxyHandle> {
            self.started.lock().unwrap().push(settings.clone());
            Ok(ProxyHandle {
                pid: self.pid,
                port: settings.port,
            })
        }

        async fn wait_ready(&self, port: u16, timeout: Duration, pid: u32) -> JvmCacheResult<()> {
            self.waited.lock().unwrap().push((port, timeout, pid));
            if self.ready {
                Ok(())
            } else {
                Err(JvmCacheError::ProxyTimeout {
                    pid,
                    port,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }

        async fn stop(&self, pid: u32) -> JvmCacheResult<()> {
            self.stopped.lock().unwrap().push(pid);
            Ok(())
        }
    }

    struct FakeToolchain {
        data_dir: PathBuf,
        events: Mutex<Vec<String>>,
    }

    impl FakeToolchain {
        fn new(dir: &TempDir) -> Self {
            Self {
                data_dir: dir.path().join("mise"),
                events: Mutex::new(Vec::new()),
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Toolchain for FakeToolchain {
        async fn install_runtime(&self) -> JvmCacheResult<()> {
            self.events.lock().unwrap().push("install-runtime".to_string());
            Ok(())
        }

        async fn install_version(&self, version: &str) -> JvmCacheResult<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("install {}", version));
            Ok(())
        }

        async fn activate_version(&self, version: &str) -> JvmCacheResult<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("activate {}", version));
            Ok(())
        }

        fn data_dir(&self) -> PathBuf {
            self.data_dir.clone()
        }

        fn path_entries(&self) -> Vec<PathBuf> {
            vec![self.data_dir.join("shims")]
        }
    }

    /// A project directory plus a home directory for one job
    struct Job {
        dir: TempDir,
    }

    impl Job {
        fn new(markers: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::create_dir_all(dir.path().join("project")).unwrap();
            std::fs::create_dir_all(dir.path().join("home")).unwrap();
            for marker in markers {
                std::fs::write(dir.path().join("project").join(marker), "").unwrap();
            }
            Self { dir }
        }

        fn project(&self) -> PathBuf {
            self.dir.path().join("project")
        }

        fn home(&self) -> PathBuf {
            self.dir.path().join("home")
        }

        fn env(&self) -> Environment {
            Environment {
                repository: Some("myorg/myrepo".to_string()),
                maven_repo_local: Some(self.dir.path().join("m2").display().to_string()),
                home_dir: Some(self.home()),
                ..Environment::default()
            }
        }

        fn inputs(&self) -> RestoreInputs {
            RestoreInputs {
                workspace: Some("myorg/myproject".to_string()),
                working_directory: Some(self.project().display().to_string()),
                java_version: Some("17".to_string()),
                ..RestoreInputs::default()
            }
        }
    }

    fn collaborators<'a>(
        host: &'a FakeHost,
        cache: &'a FakeCache,
        proxy: &'a FakeProxy,
        toolchain: &'a FakeToolchain,
    ) -> Collaborators<'a> {
        Collaborators {
            host,
            cache,
            proxy,
            toolchain,
        }
    }

    #[tokio::test]
    async fn configured_proxy_host_reaches_gradle_script() {
        let job = Job::new(&["build.gradle"]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(54321));
        let toolchain = FakeToolchain::new(&job.dir);
        let proxy_config = ProxyConfig {
            host: "10.1.2.3".to_string(),
            ..ProxyConfig::default()
        };

        lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &job.inputs(),
            &job.env(),
            &proxy_config,
        )
        .await
        .unwrap();

        assert_eq!(proxy.started.lock().unwrap()[0].host, "10.1.2.3");
        let script =
            std::fs::read_to_string(job.home().join(".gradle/init.d/boringcache-cache.gradle"))
                .unwrap();
        assert!(script.contains("http://10.1.2.3:41234/cache/"));
    }

    #[tokio::test]
    async fn gradle_restore_then_save() {
        let job = Job::new(&["build.gradle"]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(54321));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = RestoreInputs {
            proxy_port: Some("5000".to_string()),
            read_only: Some("false".to_string()),
            ..job.inputs()
        };
        let report = lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.build_tool, BuildTool::Gradle);
        let state = host.state();
        assert_eq!(state["buildTool"], "gradle");
        assert_eq!(state["proxyPid"], "54321");
        assert!(!state.contains_key("mavenTag"));
        assert_eq!(host.outputs()["proxy-port"], "5000");

        let init_script = job.home().join(".gradle/init.d/boringcache-cache.gradle");
        let script = std::fs::read_to_string(init_script).unwrap();
        assert!(script.contains("push = true"));
        assert!(script.contains("http://127.0.0.1:5000/cache/"));
        let props = std::fs::read_to_string(job.home().join(".gradle/gradle.properties")).unwrap();
        assert!(props.contains("org.gradle.caching=true"));

        let started = proxy.started.lock().unwrap().clone();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].workspace, "myorg/myproject");
        assert_eq!(started[0].tag, "myrepo");
        assert_eq!(started[0].host, "127.0.0.1");

        let save_host = FakeHost::resume(&host);
        let save_cache = FakeCache::hit();
        let save_report = lifecycle::save(
            collaborators(&save_host, &save_cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &job.env(),
        )
        .await
        .unwrap();

        assert_eq!(proxy.stopped(), vec![54321]);
        assert_eq!(save_report.stopped_proxy, Some(54321));
        assert_eq!(save_report.saved_tags, vec!["myrepo-runtime-17"]);
        assert!(save_cache
            .calls()
            .iter()
            .all(|args| !args.iter().any(|a| a.contains("maven-deps"))));
    }

    #[tokio::test]
    async fn maven_restore_then_save() {
        let job = Job::new(&["pom.xml"]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(777));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = RestoreInputs {
            cache_java: Some("true".to_string()),
            ..job.inputs()
        };
        let report = lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.maven_restored, Some(true));
        let state = host.state();
        let maven_tag = state["mavenTag"].clone();
        assert!(maven_tag.contains("maven-deps"));
        assert_eq!(state["mavenRestored"], "true");
        assert_eq!(host.outputs()["proxy-port"], "41234");

        let restores = cache.calls_of("restore");
        assert_eq!(restores.len(), 2);
        assert!(restores[1][2].starts_with(&format!("{}:", maven_tag)));

        let mvn = job.project().join(".mvn");
        assert!(std::fs::read_to_string(mvn.join("extensions.xml"))
            .unwrap()
            .contains("maven-build-cache-extension"));
        assert!(std::fs::read_to_string(mvn.join("maven-build-cache-config.xml"))
            .unwrap()
            .contains("<url>http://127.0.0.1:41234</url>"));

        let save_host = FakeHost::resume(&host);
        let save_cache = FakeCache::hit();
        let save_inputs = SaveInputs {
            exclude: Some("*.lastUpdated".to_string()),
            ..SaveInputs::default()
        };
        lifecycle::save(
            collaborators(&save_host, &save_cache, &proxy, &toolchain),
            &save_inputs,
            &job.env(),
        )
        .await
        .unwrap();

        let saves = save_cache.calls_of("save");
        assert_eq!(saves.len(), 2);
        let maven_save = &saves[1];
        assert!(maven_save[2].starts_with(&format!("{}:", maven_tag)));
        assert_eq!(&maven_save[3..], ["--exclude", "*.lastUpdated"]);
        assert_eq!(proxy.stopped(), vec![777]);
    }

    #[tokio::test]
    async fn skip_never_ensures_cli() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        for selector in ["skip", "SKIP"] {
            let inputs = RestoreInputs {
                cli_version: Some(selector.to_string()),
                ..job.inputs()
            };
            lifecycle::restore(
                collaborators(&host, &cache, &proxy, &toolchain),
                &inputs,
                &job.env(),
                &ProxyConfig::default(),
            )
            .await
            .unwrap();
        }

        assert!(cache.ensured.lock().unwrap().is_empty());
        assert!(proxy.started.lock().unwrap().is_empty());
        assert!(!host.state().contains_key("proxyPid"));
    }

    #[tokio::test]
    async fn requested_cli_version_is_ensured() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = RestoreInputs {
            cli_version: Some("v1.8.0".to_string()),
            ..job.inputs()
        };
        lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            *cache.ensured.lock().unwrap(),
            vec![Some("v1.8.0".to_string())]
        );
    }

    #[tokio::test]
    async fn save_without_session_does_nothing() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let report = lifecycle::save(
            collaborators(&host, &cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &job.env(),
        )
        .await
        .unwrap();

        assert_eq!(report, SaveReport::default());
        assert!(cache.calls().is_empty());
        assert!(proxy.stopped().is_empty());
    }

    #[tokio::test]
    async fn partial_session_still_stops_proxy() {
        let job = Job::new(&[]);
        let host = FakeHost::with_state(&[("proxyPid", "4242")]);
        let (cache, proxy) = (FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let report = lifecycle::save(
            collaborators(&host, &cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &job.env(),
        )
        .await
        .unwrap();

        assert_eq!(proxy.stopped(), vec![4242]);
        assert!(report.saved_tags.is_empty());
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_runtime_version_skips_runtime_save() {
        let job = Job::new(&[]);
        let host = FakeHost::with_state(&[
            ("workspace", "myorg/myproject"),
            ("cacheTagPrefix", "myrepo"),
            ("buildTool", "maven"),
        ]);
        let (cache, proxy) = (FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let report = lifecycle::save(
            collaborators(&host, &cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &job.env(),
        )
        .await
        .unwrap();

        assert!(report.saved_tags.is_empty());
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn save_override_disables_runtime_cache() {
        let job = Job::new(&[]);
        let host = FakeHost::with_state(&[
            ("workspace", "myorg/myproject"),
            ("cacheTagPrefix", "myrepo"),
            ("runtimeVersion", "21"),
            ("cacheRuntime", "true"),
        ]);
        let (cache, proxy) = (FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = SaveInputs {
            cache_java: Some("false".to_string()),
            ..SaveInputs::default()
        };
        lifecycle::save(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
        )
        .await
        .unwrap();

        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn restore_disabled_runtime_cache_is_respected_by_save() {
        let job = Job::new(&[]);
        let host = FakeHost::with_state(&[
            ("workspace", "myorg/myproject"),
            ("cacheTagPrefix", "myrepo"),
            ("runtimeVersion", "21"),
            ("cacheRuntime", "false"),
        ]);
        let (cache, proxy) = (FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        lifecycle::save(
            collaborators(&host, &cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &job.env(),
        )
        .await
        .unwrap();

        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn save_uses_recorded_verbosity() {
        let job = Job::new(&[]);
        let host = FakeHost::with_state(&[
            ("workspace", "myorg/myproject"),
            ("cacheTagPrefix", "myrepo"),
            ("runtimeVersion", "21"),
            ("verbose", "true"),
        ]);
        let (cache, proxy) = (FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        lifecycle::save(
            collaborators(&host, &cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &job.env(),
        )
        .await
        .unwrap();

        let calls = cache.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![
                "save".to_string(),
                "myorg/myproject".to_string(),
                format!("myrepo-runtime-21:{}", toolchain.data_dir().display()),
                "--verbose".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn proxy_timeout_keeps_pid() {
        let job = Job::new(&["settings.gradle.kts"]);
        let (host, cache, proxy) = (
            FakeHost::default(),
            FakeCache::hit(),
            FakeProxy::never_ready(9999),
        );
        let toolchain = FakeToolchain::new(&job.dir);
        let proxy_config = ProxyConfig {
            ready_timeout_ms: 500,
            ..ProxyConfig::default()
        };

        let inputs = job.inputs();
        let env = job.env();
        let outcome = run_phase(
            "Restore",
            FailurePolicy::Fail,
            &host,
            lifecycle::restore(
                collaborators(&host, &cache, &proxy, &toolchain),
                &inputs,
                &env,
                &proxy_config,
            ),
        )
        .await;

        assert_eq!(outcome, PhaseOutcome::Failed);
        assert_eq!(host.state()["proxyPid"], "9999");
        assert!(!host.outputs().contains_key("proxy-port"));
        assert!(!host.outputs().contains_key("workspace"));
        assert_eq!(
            proxy.waited.lock().unwrap()[0],
            (41234, Duration::from_millis(500), 9999)
        );
        assert_eq!(host.failures.lock().unwrap().len(), 1);
        assert!(host.failures.lock().unwrap()[0].contains("9999"));
        assert!(!job
            .home()
            .join(".gradle/init.d/boringcache-cache.gradle")
            .exists());

        let save_host = FakeHost::resume(&host);
        lifecycle::save(
            collaborators(&save_host, &cache, &proxy, &toolchain),
            &SaveInputs::default(),
            &env,
        )
        .await
        .unwrap();
        assert_eq!(proxy.stopped(), vec![9999]);
    }

    #[tokio::test]
    async fn runtime_cache_hit_activates() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let report = lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &job.inputs(),
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        assert!(report.runtime_cache_hit);
        assert_eq!(toolchain.events(), vec!["install-runtime", "activate 17"]);
        let outputs = host.outputs();
        assert_eq!(outputs["java-cache-hit"], "true");
        assert_eq!(outputs["cache-hit"], "true");
        assert_eq!(*host.paths.lock().unwrap(), toolchain.path_entries());

        let restores = cache.calls_of("restore");
        assert_eq!(
            restores[0],
            vec![
                "restore".to_string(),
                "myorg/myproject".to_string(),
                format!("myrepo-runtime-17:{}", toolchain.data_dir().display()),
            ]
        );
    }

    #[tokio::test]
    async fn runtime_cache_miss_installs() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::miss(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &job.inputs(),
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(toolchain.events(), vec!["install-runtime", "install 17"]);
        assert_eq!(host.outputs()["java-cache-hit"], "false");
        assert_eq!(host.outputs()["cache-hit"], "false");
    }

    #[tokio::test]
    async fn disabled_runtime_cache_skips_restore() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = RestoreInputs {
            cache_java: Some("false".to_string()),
            ..job.inputs()
        };
        lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        assert!(cache.calls().is_empty());
        assert!(!host.outputs().contains_key("java-cache-hit"));
        assert_eq!(host.outputs()["cache-hit"], "false");
        assert_eq!(host.state()["cacheRuntime"], "false");
        assert_eq!(toolchain.events(), vec!["install-runtime", "install 17"]);
    }

    #[tokio::test]
    async fn restore_is_repeatable() {
        let job = Job::new(&["build.gradle.kts"]);
        let toolchain = FakeToolchain::new(&job.dir);
        let inputs = RestoreInputs {
            read_only: Some("true".to_string()),
            ..job.inputs()
        };

        let mut runs = Vec::new();
        for pid in [100, 200] {
            let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(pid));
            lifecycle::restore(
                collaborators(&host, &cache, &proxy, &toolchain),
                &inputs,
                &job.env(),
                &ProxyConfig::default(),
            )
            .await
            .unwrap();

            let mut outputs = host.outputs();
            outputs.remove("proxy-port");
            let mut state = host.state();
            state.remove("proxyPid");
            runs.push((outputs, state));
        }

        assert_eq!(runs[0], runs[1]);
        let script = std::fs::read_to_string(
            job.home().join(".gradle/init.d/boringcache-cache.gradle"),
        )
        .unwrap();
        assert!(script.contains("push = false"));
    }

    #[tokio::test]
    async fn bare_workspace_gets_default_org() {
        let job = Job::new(&[]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = RestoreInputs {
            workspace: Some("myproject".to_string()),
            cache_tag: Some("custom".to_string()),
            ..job.inputs()
        };
        lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap();

        let outputs = host.outputs();
        assert_eq!(outputs["workspace"], "default/myproject");
        assert_eq!(outputs["cache-tag"], "custom");
        assert_eq!(outputs["java-version"], "17");
        assert_eq!(host.state()["workspace"], "default/myproject");
    }

    #[tokio::test]
    async fn missing_workspace_fails_before_any_work() {
        let job = Job::new(&["pom.xml"]);
        let (host, cache, proxy) = (FakeHost::default(), FakeCache::hit(), FakeProxy::new(1));
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = RestoreInputs {
            workspace: None,
            ..job.inputs()
        };
        let err = lifecycle::restore(
            collaborators(&host, &cache, &proxy, &toolchain),
            &inputs,
            &job.env(),
            &ProxyConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, JvmCacheError::WorkspaceRequired));
        assert!(host.state().is_empty());
        assert!(cache.ensured.lock().unwrap().is_empty());
        assert!(toolchain.events().is_empty());
    }

    #[tokio::test]
    async fn save_errors_are_warnings() {
        let job = Job::new(&[]);
        let host = FakeHost::with_state(&[
            ("workspace", "myorg/myproject"),
            ("cacheTagPrefix", "myrepo"),
            ("runtimeVersion", "21"),
        ]);
        let cache = FakeCache {
            fail_saves: true,
            ..FakeCache::hit()
        };
        let proxy = FakeProxy::new(1);
        let toolchain = FakeToolchain::new(&job.dir);

        let inputs = SaveInputs::default();
        let env = job.env();
        let outcome = run_phase(
            "Save",
            FailurePolicy::Warn,
            &host,
            lifecycle::save(
                collaborators(&host, &cache, &proxy, &toolchain),
                &inputs,
                &env,
            ),
        )
        .await;

        assert!(outcome.is_success());
        assert!(host.failures.lock().unwrap().is_empty());
        let warnings = host.warnings.lock().unwrap().clone();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Save failed:"));
    }
}

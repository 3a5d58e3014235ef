//! Test CLI commands
#[cfg(test)]
use serial_test::serial;

#[cfg(test)]
#[serial]
mod test_cli {
    use std::{
        env, fs,
        process::{Command, Output},
    };

    fn mrpp() -> Command {
        Command::new(env!("CARGO_BIN_EXE_mrpp"))
    }

    fn run(cmd: &mut Command) -> Output {
        cmd.output()
            .unwrap_or_else(|err| panic!("Failed to execute: {err}"))
    }

    fn assert_success(output: &Output) {
        assert!(
            output.status.success(),
            "Failed to execute command: stdout: {}; stderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn stdout(output: &Output) -> String {
        String::from_utf8(output.stdout.clone()).unwrap()
    }

    #[test]
    fn test_help() {
        let output = run(mrpp().arg("--help"));
        assert_success(&output);
    }

    #[test]
    fn test_spec_toml() {
        let output = run(mrpp()
            .arg("spec")
            .arg("./tests/resources/two_robots.toml"));
        assert_success(&output);

        let out = stdout(&output);
        assert!(out.contains("sys_vars(1) {"));
        assert!(out.contains("    loc: [0, 80];"));
        assert!(out.contains("sys_init(1) {\n    loc=27;\n}"));
        assert!(out.contains("sys_prog(3) {"));
        assert!(out.contains("env_vars(0) {"));
    }

    #[test]
    fn test_spec_json() {
        let output = run(mrpp()
            .arg("spec")
            .arg("./tests/resources/single_robot.json")
            .arg("--format")
            .arg("json"));
        assert_success(&output);

        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["sys"]["init"], serde_json::json!(["loc=0"]));
        assert_eq!(
            json["sys"]["safety"],
            serde_json::json!(["loc=0 -> X (loc=1)", "loc=1 -> X (loc=0)"])
        );
        assert_eq!(json["sys"]["prog"], serde_json::json!(["( loc=1 )"]));
    }

    #[test]
    fn test_spec_config_file() {
        let output = run(mrpp()
            .arg("spec")
            .arg("./tests/resources/single_robot.json")
            .arg("-c")
            .arg("./tests/resources/structured.toml"));
        assert_success(&output);

        let out = stdout(&output);
        assert!(out.contains("    x1: [0, 1];"));
        assert!(out.contains("    stop1: boolean;"));
        assert!(!out.contains("loc"));
    }

    #[test]
    fn test_spec_with_delays() {
        let output = run(mrpp()
            .arg("spec")
            .arg("./tests/resources/single_robot.json")
            .arg("-c")
            .arg("./tests/resources/delayed.toml"));
        assert_success(&output);

        let out = stdout(&output);
        assert!(out.contains("    delay1: boolean;"));
        assert!(out.contains("    d1: [-1, 2];"));
        assert!(out.contains("    !(d1=2);"));
        assert!(out.contains("    ( x1=0 && right1 ) -> ( X (x1=1 && !delay1) || X (x1=0 && delay1) );"));
    }

    #[test]
    fn test_spec_env_override() {
        let output = run(mrpp()
            .env("MRPP_ENCODER__ENCODING", "structured")
            .arg("spec")
            .arg("./tests/resources/single_robot.json"));
        assert_success(&output);

        let out = stdout(&output);
        assert!(out.contains("    x1: [0, 1];"));
        assert!(!out.contains("stop1"));
    }

    #[test]
    fn test_spec_output_file() {
        let out_file = env::temp_dir().join("mrpp_test_spec_output.txt");
        let _ = fs::remove_file(&out_file);

        let output = run(mrpp()
            .arg("spec")
            .arg("./tests/resources/single_robot.json")
            .arg("-o")
            .arg(&out_file));
        assert_success(&output);

        let spec = fs::read_to_string(&out_file).unwrap();
        assert!(spec.contains("    loc=0 -> X (loc=1);"));
        fs::remove_file(&out_file).unwrap();
    }

    #[test]
    fn test_spec_missing_file() {
        let output = run(mrpp()
            .arg("spec")
            .arg("./tests/resources/does_not_exist.toml"));
        assert!(!output.status.success());
    }

    #[test]
    fn test_spec_warns_about_cells_outside_of_grid() {
        let problem_file = env::temp_dir().join("mrpp_test_outside_cells.toml");
        fs::write(
            &problem_file,
            "robots = [0]\n\n[grid]\nrows = 2\ncols = 2\n\n[[goals]]\nkind = \"recurrence\"\ncells = [[5, 5], 3]\nrobot = 0\n",
        )
        .unwrap();

        let output = run(mrpp().arg("spec").arg(&problem_file));
        assert_success(&output);

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Ignoring goal cell [5, 5]"), "stderr: {stderr}");
        assert!(!stderr.contains("Ignoring cell 4"), "stderr: {stderr}");
        assert!(stdout(&output).contains("    ( loc=3 );"));

        fs::remove_file(&problem_file).unwrap();
    }

    #[test]
    fn test_transitions() {
        let output = run(mrpp()
            .arg("transitions")
            .args(["--rows", "2", "--cols", "2", "--robots", "1"]));
        assert_success(&output);

        let out = stdout(&output);
        assert!(out.starts_with("loc=0 -> X (loc=1 || loc=2)\n"));
        assert!(out.contains("# 4 transitions, 0 dead states"));
    }

    #[test]
    fn test_transitions_stay_parallel() {
        let output = run(mrpp()
            .arg("transitions")
            .args(["--rows", "1", "--cols", "2", "--robots", "2"])
            .arg("--stay")
            .arg("--parallel"));
        assert_success(&output);

        assert_eq!(
            stdout(&output),
            "loc=1 -> X (loc=1)\nloc=2 -> X (loc=2)\n# 2 transitions, 0 dead states\n"
        );
    }

    #[test]
    fn test_encode_decode() {
        let output = run(mrpp()
            .arg("encode")
            .args(["--rows", "3", "--cols", "3", "0", "3"]));
        assert_success(&output);
        assert_eq!(stdout(&output), "27\n");

        let output = run(mrpp()
            .arg("decode")
            .args(["--rows", "3", "--cols", "3", "--robots", "2", "27"]));
        assert_success(&output);
        assert_eq!(stdout(&output), "loc=27: (0, 0) (1, 0)\n");

        let output = run(mrpp()
            .arg("decode")
            .args(["--rows", "3", "--cols", "3", "--robots", "2", "81"]));
        assert!(!output.status.success());
    }

    #[test]
    fn test_debug() {
        let output = run(mrpp()
            .arg("--debug")
            .arg("spec")
            .arg("./tests/resources/two_robots.toml"));
        assert_success(&output);
    }

    #[test]
    fn test_log_config() {
        let output = run(mrpp()
            .arg("--logger-config-file")
            .arg("./tests/resources/log_config.yaml")
            .arg("spec")
            .arg("./tests/resources/two_robots.toml"));
        assert_success(&output);
        assert!(String::from_utf8_lossy(&output.stderr).contains("DEBUG"));
    }
}

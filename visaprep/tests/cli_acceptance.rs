use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("visaprep");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }
}

fn shipped_questions() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../data/questions.json")
        .to_string_lossy()
        .into_owned()
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("visaprep"));
    let mut command = Command::new(bin_path);

    command
        .args(args)
        .current_dir(&env.home)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("OPENAI_API_KEY")
        .env_remove("GPT_API_KEY")
        .env_remove("VISAPREP_QUESTIONS")
        .env_remove("VISAPREP_GRADER_ENDPOINT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute visaprep: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "visaprep {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn questions_easy_lists_six_in_order() {
    let env = CliTestEnv::new();
    let questions = shipped_questions();
    let args = ["--questions", questions.as_str(), "questions", "--level", "easy"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6 questions (easy level)"), "got:\n{stdout}");
    assert!(stdout.contains(" 1. [College]"));
    assert!(stdout.contains(" 2. [Major]"));
    assert!(stdout.contains("[Purpose of Study]"));
    assert!(!stdout.contains("[Immigration Intent]"));

    assert!(
        env.xdg_state.join("visaprep").exists(),
        "log directory should be created under XDG_STATE_HOME"
    );
}

#[test]
fn questions_json_output_parses() {
    let env = CliTestEnv::new();
    let questions = shipped_questions();
    let args = [
        "--questions",
        questions.as_str(),
        "questions",
        "--level",
        "medium",
        "--format",
        "json",
    ];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let list = parsed.as_array().expect("expected a JSON array");
    assert_eq!(list.len(), 9);
    assert_eq!(list[0]["id"], "q0_college");
    assert_eq!(list[2]["id"], "q1_Purpose_of_Study");
}

#[test]
fn unknown_level_is_rejected() {
    let env = CliTestEnv::new();
    let questions = shipped_questions();
    let output = run_bin(
        &env,
        &["--questions", questions.as_str(), "questions", "--level", "extreme"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown level"), "got:\n{stderr}");
}

#[test]
fn missing_question_file_fails() {
    let env = CliTestEnv::new();
    let output = run_bin(&env, &["--questions", "/nonexistent/questions.json", "questions"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load question bank"), "got:\n{stderr}");
}

#[test]
fn invalid_explicit_question_file_is_not_replaced() {
    let env = CliTestEnv::new();
    let local_data = env.home.join("data");
    fs::create_dir_all(&local_data).expect("failed to create data dir");
    fs::copy(shipped_questions(), local_data.join("questions.json"))
        .expect("failed to copy question bank");

    let custom = env.home.join("custom.json");
    fs::write(&custom, r#"{"Purpose of Study": ["Why the US?"]}"#)
        .expect("failed to write custom bank");
    let custom = custom.to_string_lossy().into_owned();

    let output = run_bin(&env, &["--questions", custom.as_str(), "questions"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("required category"), "got:\n{stderr}");

    // without an explicit path the working-directory copy is used
    let args = ["questions", "--level", "easy"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);
}

#[test]
fn grade_without_api_key_fails_before_network() {
    let env = CliTestEnv::new();
    let output = run_bin(
        &env,
        &["grade", "--question", "Why the US?", "--answer", "For the program."],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to create grader"), "got:\n{stderr}");
    assert!(stderr.contains("api_key"), "got:\n{stderr}");
}

#[test]
fn check_reports_config_and_questions() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[grader]
model = "gpt-4o-mini"
api_key = "sk-test"

[store]
max_sessions = 25
"#,
    );
    let questions = shipped_questions();
    let args = ["--questions", questions.as_str(), "check"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("visaprep Configuration"));
    assert!(stdout.contains("(found)"));
    assert!(stdout.contains("Model:         gpt-4o-mini"));
    assert!(stdout.contains("API key:       configured"));
    assert!(stdout.contains("Max sessions:  25"));
    assert!(stdout.contains("Purpose of Study"));
}

#[test]
fn invalid_config_aborts_startup() {
    let env = CliTestEnv::new();
    env.write_config("[grader]\ntimeout_secs = 0\n");

    let output = run_bin(&env, &["check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load configuration"), "got:\n{stderr}");
}

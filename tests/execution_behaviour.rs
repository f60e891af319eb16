//! Behaviour-driven coverage for validation runs.
//!
//! Scenarios register scripted checkers against a package on disk and assert
//! on the resulting report, the execution order, and how failures surface.

use camino::Utf8PathBuf;
use pvpcheck::{
    CheckRegistry, Checker, CheckerError, Context, EditorTarget, EngineError, ExecutionEngine,
    FindingsCollector, Input, LocalPackageResolver, PackageIdentity, Report, RunPhase,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::TempDir;

const PACKAGE: &str = "com.example.tools@1.0.0";

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|stripped| stripped.strip_suffix('"'))
        .unwrap_or(value)
}

/// Checker declarations outlive the registry, so step arguments are leaked.
fn leak(value: &str) -> &'static str {
    Box::leak(unquote(value).to_owned().into_boxed_str())
}

#[derive(Clone, Copy)]
enum Behaviour {
    Silent,
    Report(&'static str),
    Internal(&'static str),
    Fail(&'static str),
    Undeclared(&'static str),
}

struct ScriptedChecker {
    name: &'static str,
    checks: [&'static str; 1],
    behaviour: Behaviour,
    executed: Rc<RefCell<Vec<String>>>,
}

impl Checker for ScriptedChecker {
    fn name(&self) -> &str {
        self.name
    }

    fn checks(&self) -> &[&str] {
        &self.checks
    }

    fn run(
        &self,
        _input: &Input,
        findings: &mut FindingsCollector<'_>,
    ) -> Result<(), CheckerError> {
        self.executed.borrow_mut().push(self.name.to_owned());
        let [check] = self.checks;
        match self.behaviour {
            Behaviour::Silent => Ok(()),
            Behaviour::Report(message) => Ok(findings.error(check, message)?),
            Behaviour::Internal(message) => Err(CheckerError::internal(message)),
            Behaviour::Fail(message) => Err(CheckerError::failed(message)),
            Behaviour::Undeclared(other) => Ok(findings.error(other, "misattributed")?),
        }
    }
}

struct ExecutionWorld {
    packages: TempDir,
    checkers: RefCell<Vec<Box<dyn Checker>>>,
    executed: Rc<RefCell<Vec<String>>>,
    progress: RefCell<Vec<(usize, usize)>>,
    outcome: RefCell<Option<Result<Report, EngineError>>>,
}

impl ExecutionWorld {
    fn new() -> Self {
        Self {
            packages: TempDir::new().unwrap_or_else(|error| panic!("create temp dir: {error}")),
            checkers: RefCell::new(Vec::new()),
            executed: Rc::default(),
            progress: RefCell::new(Vec::new()),
            outcome: RefCell::new(None),
        }
    }

    fn packages_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::try_from(self.packages.path().to_path_buf())
            .unwrap_or_else(|error| panic!("temp dir should be UTF-8: {error}"))
    }

    fn add_file(&self, relative: &str) {
        let path = self.packages_dir().join(PACKAGE).join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|error| panic!("create {parent}: {error}"));
        }
        std::fs::write(&path, "content").unwrap_or_else(|error| panic!("write {path}: {error}"));
    }

    fn register(&self, name: &str, check: &str, behaviour: Behaviour) {
        self.checkers.borrow_mut().push(Box::new(ScriptedChecker {
            name: leak(name),
            checks: [leak(check)],
            behaviour,
            executed: Rc::clone(&self.executed),
        }));
    }

    fn validate(&self) {
        let checkers = self.checkers.take();
        let registry =
            CheckRegistry::new(checkers).unwrap_or_else(|error| panic!("registry: {error}"));
        let engine = ExecutionEngine::new(
            registry,
            LocalPackageResolver::new(self.packages_dir()),
            "pvpcheck@test",
            EditorTarget::new("2022.3"),
        )
        .with_context(Context::empty());
        let package =
            PackageIdentity::parse(PACKAGE).unwrap_or_else(|error| panic!("identity: {error}"));

        let outcome = engine.run_with_progress(&package, |done, total| {
            self.progress.borrow_mut().push((done, total));
        });
        self.outcome.replace(Some(outcome));
    }

    fn findings(&self, check: &str) -> Vec<String> {
        match self.outcome.borrow().as_ref() {
            Some(Ok(report)) => report
                .errors_for(check)
                .unwrap_or_else(|| panic!("{check} missing from report"))
                .to_vec(),
            Some(Err(error)) => panic!("expected the run to complete: {error}"),
            None => panic!("the package should be validated"),
        }
    }

    fn with_error<T>(&self, inspect: impl FnOnce(&EngineError) -> T) -> T {
        match self.outcome.borrow().as_ref() {
            Some(Err(error)) => inspect(error),
            Some(Ok(_)) => panic!("expected the run to abort"),
            None => panic!("the package should be validated"),
        }
    }
}

#[fixture]
fn world() -> ExecutionWorld {
    ExecutionWorld::new()
}

#[given("a package containing {path}")]
fn given_package(world: &ExecutionWorld, path: String) {
    world.add_file(unquote(&path));
}

#[given("a checker {name} owning {check} that finds nothing")]
fn given_silent(world: &ExecutionWorld, name: String, check: String) {
    world.register(&name, &check, Behaviour::Silent);
}

#[given("a checker {name} owning {check} that reports the finding {message}")]
fn given_reporting(world: &ExecutionWorld, name: String, check: String, message: String) {
    world.register(&name, &check, Behaviour::Report(leak(&message)));
}

#[given("a checker {name} owning {check} that fails internally with {message}")]
fn given_internal(world: &ExecutionWorld, name: String, check: String, message: String) {
    world.register(&name, &check, Behaviour::Internal(leak(&message)));
}

#[given("a checker {name} owning {check} that fails with {message}")]
fn given_failing(world: &ExecutionWorld, name: String, check: String, message: String) {
    world.register(&name, &check, Behaviour::Fail(leak(&message)));
}

#[given("a checker {name} owning {check} that reports under the undeclared check {other}")]
fn given_undeclared(world: &ExecutionWorld, name: String, check: String, other: String) {
    world.register(&name, &check, Behaviour::Undeclared(leak(&other)));
}

#[when("the package is validated")]
fn when_validated(world: &ExecutionWorld) {
    world.validate();
}

#[then("the run completes")]
fn then_completes(world: &ExecutionWorld) {
    let outcome = world.outcome.borrow();
    match outcome.as_ref() {
        Some(Ok(_)) => {}
        Some(Err(error)) => panic!("expected the run to complete: {error}"),
        None => panic!("the package should be validated"),
    }
}

#[then("check {check} has no findings")]
fn then_no_findings(world: &ExecutionWorld, check: String) {
    assert!(world.findings(unquote(&check)).is_empty());
}

#[then("check {check} has the finding {message}")]
fn then_finding(world: &ExecutionWorld, check: String, message: String) {
    let expected = vec![unquote(&message).to_owned()];
    assert_eq!(world.findings(unquote(&check)), expected);
}

#[then("the checkers ran in the order {order}")]
fn then_order(world: &ExecutionWorld, order: String) {
    let expected: Vec<&str> = unquote(&order).split(',').collect();
    assert_eq!(*world.executed.borrow(), expected);
}

#[then("the run aborts while executing")]
fn then_aborts(world: &ExecutionWorld) {
    world.with_error(|error| assert_eq!(error.phase(), RunPhase::Executing));
}

#[then("the failure is an invariant violation")]
fn then_invariant(world: &ExecutionWorld) {
    let violation = world.with_error(EngineError::is_invariant_violation);
    assert!(violation, "expected an invariant violation");
}

#[then("progress was reported as {ticks}")]
fn then_progress(world: &ExecutionWorld, ticks: String) {
    let reported: Vec<String> = world
        .progress
        .borrow()
        .iter()
        .map(|(done, total)| format!("{done}/{total}"))
        .collect();
    assert_eq!(reported.join(","), unquote(&ticks));
}

#[scenario("tests/features/execution.feature", index = 0)]
fn scenario_every_check_present(world: ExecutionWorld) {
    let _ = world;
}

#[scenario("tests/features/execution.feature", index = 1)]
fn scenario_internal_error_isolated(world: ExecutionWorld) {
    let _ = world;
}

#[scenario("tests/features/execution.feature", index = 2)]
fn scenario_unhandled_failure_aborts(world: ExecutionWorld) {
    let _ = world;
}

#[scenario("tests/features/execution.feature", index = 3)]
fn scenario_undeclared_check_aborts(world: ExecutionWorld) {
    let _ = world;
}

#[scenario("tests/features/execution.feature", index = 4)]
fn scenario_progress_reported(world: ExecutionWorld) {
    let _ = world;
}

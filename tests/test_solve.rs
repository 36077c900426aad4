use assert_cmd::{assert::Assert, Command};
use assert_fs::{prelude::FileWriteStr, NamedTempFile};
use predicates::prelude::{predicate, PredicateBooleanExt};

const GCD: &str = r#"
% greatest common divisor
zero @ gcd(0) <=> true.
step @ gcd(N) \ gcd(M) <=> N <= M | L is M mod N, gcd(L).

gcd(94017), gcd(1155), gcd(2035).
"#;

const GCD_WITH_ASSIGNMENT_GUARD: &str = r#"
gcd(0) <=> true.
gcd(N) \ gcd(M) <=> N<=M, L is M mod N | gcd(L).

gcd(94017), gcd(1155), gcd(2035).
"#;

const LEQ: &str = r#"
reflexivity @ leq(X, X) <=> true.
antisymmetry @ leq(X, Y), leq(Y, X) <=> X == Y.
idempotence @ leq(X, Y) \ leq(X, Y) <=> true.
transitivity @ leq(X, Y), leq(Y, Z) ==> leq(X, Z).

leq(a, b), leq(b, c), leq(c, a).
"#;

const PRIMES: &str = r#"
candidate @ prime(N) ==> N > 2 | prime(N - 1).
sieve @ prime(A) \ prime(B) <=> B mod A == 0 | true.

prime(20).
"#;

const COUNTER: &str = r#"
count(N) <=> M is N + 1 | count(M).
count(0).
"#;

fn solve(program: &str, additional_args: &[&str]) -> Result<Assert, Box<dyn std::error::Error>> {
    let file = NamedTempFile::new("program.chr")?;
    file.write_str(program)?;
    let mut cmd = Command::cargo_bin("chrust")?;
    cmd.arg("solve")
        .arg("-f")
        .arg(file.path())
        .arg("--logging-level")
        .arg("off")
        .args(additional_args);
    let assert = cmd.assert();
    file.close()?;
    Ok(assert)
}

#[test]
fn test_gcd() -> Result<(), Box<dyn std::error::Error>> {
    solve(GCD, &[])?
        .success()
        .stdout(predicate::eq("[gcd(11)]\n[]\n"));
    Ok(())
}

#[test]
fn test_gcd_with_assignment_guard() -> Result<(), Box<dyn std::error::Error>> {
    solve(GCD_WITH_ASSIGNMENT_GUARD, &[])?
        .success()
        .stdout(predicate::eq("[gcd(11)]\n[]\n"));
    Ok(())
}

#[test]
fn test_leq() -> Result<(), Box<dyn std::error::Error>> {
    solve(LEQ, &[])?
        .success()
        .stdout(predicate::eq("[]\n[a==c, b==c]\n"));
    Ok(())
}

#[test]
fn test_leq_clauses() -> Result<(), Box<dyn std::error::Error>> {
    solve(LEQ, &["--writer", "clauses"])?
        .success()
        .stdout(predicate::eq("% built-in\na==c.\nb==c.\n"));
    Ok(())
}

#[test]
fn test_primes() -> Result<(), Box<dyn std::error::Error>> {
    solve(PRIMES, &[])?.success().stdout(predicate::eq(
        "[prime(19), prime(17), prime(13), prime(11), prime(7), prime(5), prime(3), prime(2)]\n[]\n",
    ));
    Ok(())
}

#[test]
fn test_non_termination() -> Result<(), Box<dyn std::error::Error>> {
    solve(COUNTER, &["--max-iterations", "50"])?
        .success()
        .stdout(predicate::eq("NON-TERMINATION\n[count(51)]\n[]\n"));
    Ok(())
}

#[test]
fn test_trace_is_logged() -> Result<(), Box<dyn std::error::Error>> {
    let file = NamedTempFile::new("program.chr")?;
    file.write_str(GCD)?;
    let mut cmd = Command::cargo_bin("chrust")?;
    cmd.arg("solve")
        .arg("-f")
        .arg(file.path())
        .arg("--trace")
        .arg("firings")
        .arg("--logging-level")
        .arg("debug");
    cmd.assert().success().stdout(
        predicate::str::contains("rule step fired on")
            .and(predicate::str::contains("[gcd(11)]\n[]\n")),
    );
    file.close().unwrap();
    Ok(())
}

#[test]
fn test_invalid_max_iterations() -> Result<(), Box<dyn std::error::Error>> {
    solve(GCD, &["--max-iterations", "many"])?.failure();
    Ok(())
}

#[test]
fn test_missing_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("chrust")?;
    cmd.arg("solve")
        .arg("-f")
        .arg("/nonexistent/program.chr")
        .arg("--logging-level")
        .arg("off");
    cmd.assert().failure();
    Ok(())
}

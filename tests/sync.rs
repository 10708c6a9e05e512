//! Outcomes of synchronous units of work.

use std::convert::Infallible;
use std::error::Error as _;
use std::panic::{self, AssertUnwindSafe};

use notry::{notry, notry_with, BoxError, Did, Of, Quit, Quitable, Quitted};
use thiserror::Error;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Error, PartialEq)]
#[error("code {code}")]
struct CodeError {
    code: u32,
}

#[derive(Debug, PartialEq)]
struct CustomFault;

#[test]
fn returns_value() {
    init_logging();
    let did: Did<i32, &str> = notry(|_quit| 42);
    assert!(matches!(did, Did::Yes(42)));
}

#[test]
fn passes_arguments() {
    let did: Did<bool, &str> = notry_with(|_quit, val| val, true);
    assert!(matches!(did, Did::Yes(true)));
}

#[test]
fn passes_tuple_arguments() {
    let did = notry_with(
        |quit, (a, b): (i32, i32)| {
            quit.ensure(b != 0, "division by zero");
            a / b
        },
        (7, 0),
    );
    assert!(matches!(did, Did::No { n: "division by zero", exception: None }));
}

#[test]
fn abort_reports_payload() {
    init_logging();
    let did: Did<(), &str> = notry(|quit| {
        quit.abort("bad");
    });
    assert!(matches!(did, Did::No { n: "bad", exception: None }));
}

#[test]
fn abort_skips_rest_of_work() {
    fn stop(quit: &Quit<&'static str>) {
        quit.abort("bad")
    }

    let mut reached = false;
    let did: Did<(), &str> = notry(|quit| {
        stop(&quit);
        reached = true;
    });
    assert!(did.is_no());
    assert!(!reached);
}

#[test]
fn abort_unwinds_through_helpers() {
    fn level_three(quit: &Quit<u8>) -> u8 {
        quit.abort(3)
    }
    fn level_two(quit: &Quit<u8>) -> u8 {
        level_three(quit) + 1
    }

    let did = notry(|quit| level_two(&quit) + 1);
    assert!(matches!(did, Did::No { n: 3, .. }));
}

#[test]
fn ensure_false_aborts() {
    let did: Did<(), &str> = notry(|quit| quit.ensure(1 > 2, "bad"));
    assert!(matches!(did, Did::No { n: "bad", exception: None }));
}

#[test]
fn ensure_true_continues() {
    let did: Did<(), &str> = notry(|quit| quit.ensure(1 < 2, "bad"));
    assert!(matches!(did, Did::Yes(())));
}

#[test]
fn some_narrows_option() {
    let lookup = |key: &str| {
        [("a", 1), ("b", 2)]
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    };

    let found: Did<i32, String> = notry(|quit| quit.some(lookup("b"), "missing".into()));
    assert!(matches!(found, Did::Yes(2)));

    let missing: Did<i32, String> = notry(|quit| quit.some(lookup("z"), "missing".into()));
    assert_eq!(missing.no().as_deref(), Some("missing"));
}

#[test]
fn catch_err_reports_fallback_and_exception() {
    let did: Did<(), &str> = notry(|quit| {
        quit.catch(|| Err::<(), _>(CodeError { code: 1 }), "fail");
    });
    assert!(did.is_no());
    assert_eq!(
        did.exception().and_then(|e| e.downcast_ref::<CodeError>()),
        Some(&CodeError { code: 1 })
    );
    assert_eq!(did.no(), Some("fail"));
}

#[test]
fn catch_ok_returns_value() {
    let did: Did<&str, &str> = notry(|quit| quit.catch(|| Ok::<_, Infallible>("pass"), "fail"));
    assert!(matches!(did, Did::Yes("pass")));
}

#[test]
fn catch_passes_captured_arguments() {
    let input = "17";
    let did: Did<u32, &str> = notry(|quit| quit.catch(|| input.parse::<u32>(), "fail"));
    assert!(matches!(did, Did::Yes(17)));
}

#[test]
fn catch_converts_panic_into_abort() {
    let did: Did<(), &str> = notry(|quit| {
        quit.catch(|| -> Result<(), Infallible> { panic!("guarded panic") }, "fail");
    });
    let exception = did.exception().unwrap();
    assert!(exception.is_panic());
    assert_eq!(exception.panic_message(), Some("guarded panic"));
}

#[test]
fn unexpected_panic_is_not_converted() {
    init_logging();
    let caught = panic::catch_unwind(|| {
        let _: Did<(), &str> = notry(|_quit| panic::panic_any(CustomFault));
    })
    .unwrap_err();
    assert_eq!(caught.downcast_ref::<CustomFault>(), Some(&CustomFault));
}

#[test]
fn unexpected_panic_after_catch_is_not_converted() {
    let caught = panic::catch_unwind(|| {
        let _: Did<(), &str> = notry(|quit| {
            let v = quit.catch(|| Ok::<_, Infallible>(1), "fail");
            if v == 1 {
                panic::panic_any(CustomFault);
            }
        });
    })
    .unwrap_err();
    assert!(caught.is::<CustomFault>());
}

#[test]
fn handles_are_scoped_to_their_invocation() {
    let outer: Did<&str, &str> = notry(|outer| {
        let inner: Did<(), &str> = notry(|_| outer.abort("outer"));
        let _ = inner;
        "unreachable"
    });
    assert_eq!(outer.no(), Some("outer"));
}

#[test]
fn handle_used_after_invocation_panics() {
    let mut escaped = None;
    let _: Did<(), &str> = notry(|quit| escaped = Some(quit));
    let quit = escaped.unwrap();
    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        quit.abort("late");
    }))
    .unwrap_err();
    let message = caught.downcast_ref::<String>().unwrap();
    assert!(message.contains("used after its notry invocation"));
}

fn fail_true(quit: &Quit<bool>) {
    quit.abort(true)
}

fn never_fails(_quit: &Quit<Infallible>) -> u8 {
    5
}

#[test]
fn narrowed_handle_feeds_helpers() {
    let did: Did<u8, Option<bool>> = notry(|quit| {
        let n = never_fails(&quit.never());
        fail_true(&quit.narrow());
        n
    });
    assert_eq!(did.no(), Some(Some(true)));
}

struct Divide;

impl Quitable<(u32, u32)> for Divide {
    type Output = u32;
    type Abort = &'static str;

    fn call(self, quit: Quit<Of<Self, (u32, u32)>>, (a, b): (u32, u32)) -> u32 {
        check_divisor(&quit, b);
        a / b
    }
}

fn check_divisor(quit: &Quit<Of<Divide, (u32, u32)>>, b: u32) {
    quit.ensure(b != 0, "division by zero");
}

#[test]
fn named_unit_of_work() {
    assert!(matches!(Divide.notry((9, 3)), Did::Yes(3)));
    assert!(matches!(
        Divide.notry((9, 0)),
        Did::No { n: "division by zero", .. }
    ));
}

#[test]
fn into_result_for_question_mark() {
    fn outer() -> Result<u8, Quitted<&'static str>> {
        let v = notry(|quit| quit.some(Some(2u8), "none")).into_result()?;
        Ok(v + 1)
    }
    assert_eq!(outer().unwrap(), 3);
}

#[test]
fn quitted_boxes_into_box_error() {
    let did: Did<(), &str> = notry(|quit| {
        quit.catch(|| -> Result<(), Infallible> { panic!("inner panic") }, "fail");
    });
    let err: BoxError = did.into_result().unwrap_err().into();
    assert_eq!(err.to_string(), "quit with \"fail\"");
    assert_eq!(err.source().unwrap().to_string(), "panicked: inner panic");
}

#[test]
fn outcomes_chain_through_ok() {
    fn parse(s: &str) -> Did<u32, &'static str> {
        notry(|quit| quit.catch(|| s.parse::<u32>(), "not a number"))
    }

    let did: Did<u32, &str> = notry(|quit| quit.ok(parse("x").into_result(), "bad input") + 1);
    assert!(did.is_no());
    let source = did.exception().unwrap().downcast_ref::<Quitted<&str>>().unwrap();
    assert_eq!(source.n, "not a number");
    assert_eq!(did.no(), Some("bad input"));

    let did: Did<u32, &str> = notry(|quit| quit.ok(parse("41").into_result(), "bad input") + 1);
    assert!(matches!(did, Did::Yes(42)));
}

//! Unit test for port parsing logic mirrored from `main.rs`.

fn arg_value(args: &[&str], name: &str) -> Option<String> {
    let mut it = args.iter().skip(1);
    while let Some(a) = it.next() {
        if *a == name {
            return it.next().map(|s| s.to_string());
        }
        if let Some(v) = a.strip_prefix(name).and_then(|r| r.strip_prefix('=')) {
            return Some(v.to_string());
        }
    }
    None
}

fn parse_port(args: &[&str], default_port: u16) -> Option<u16> {
    match arg_value(args, "--port").or_else(|| arg_value(args, "-p")) {
        Some(v) => v.parse::<u16>().ok(),
        None => Some(default_port),
    }
}

#[test]
fn port_long_short_and_assign() {
    assert_eq!(parse_port(&["agent", "--port", "9001"], 3232), Some(9001));
    assert_eq!(parse_port(&["agent", "-p", "9002"], 3232), Some(9002));
    assert_eq!(parse_port(&["agent", "--port=9003"], 3232), Some(9003));
    assert_eq!(parse_port(&["agent"], 3232), Some(3232));
    assert_eq!(parse_port(&["agent", "--port", "http"], 3232), None);
}

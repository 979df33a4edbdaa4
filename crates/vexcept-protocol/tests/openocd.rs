//! OpenOCD client against an in-process fake Tcl server

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use vexcept_core::error::VexceptError;
use vexcept_core::session::ProbeSession;
use vexcept_core::types::{Address, Register, WordWidth};
use vexcept_protocol::OpenOcd;

/// Serve `script` as (expected command, reply) pairs, then swallow whatever
/// comes next until the client hangs up. Returns every command received.
fn fake_server(script: Vec<(&'static str, &'static str)>) -> (u16, JoinHandle<Vec<String>>)
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut received = Vec::new();

        let mut script = script.into_iter();
        loop {
            let mut command = Vec::new();
            if reader.read_until(0x1a, &mut command).unwrap_or(0) == 0 {
                break;
            }
            command.pop();
            let command = String::from_utf8(command).unwrap();
            received.push(command.clone());

            if let Some((expected, reply)) = script.next() {
                assert_eq!(command, expected);
                writer.write_all(reply.as_bytes()).unwrap();
                writer.write_all(&[0x1a]).unwrap();
            }
        }
        received
    });

    (port, handle)
}

fn connect(port: u16) -> OpenOcd
{
    OpenOcd::connect("127.0.0.1", port, Some(Duration::from_secs(5))).unwrap()
}

#[test]
fn test_control_commands()
{
    let (port, server) = fake_server(vec![
        ("halt", ""),
        ("cortex_m maskisr off", "cortex_m interrupt mask off"),
        ("reset halt", ""),
        ("reset run", ""),
        ("step", ""),
    ]);

    let mut openocd = connect(port);
    openocd.halt().unwrap();
    openocd.set_interrupt_masking(false).unwrap();
    openocd.reset(true).unwrap();
    openocd.reset(false).unwrap();
    openocd.single_step().unwrap();
    openocd.close().unwrap();

    let received = server.join().unwrap();
    assert_eq!(received.last().map(String::as_str), Some("exit"));
    assert_eq!(received.len(), 6);
}

#[test]
fn test_register_access()
{
    let (port, server) = fake_server(vec![
        ("reg 15", "pc (/32): 0x08000100"),
        ("reg 16", "xPSR (/32): 0x01000004"),
        ("reg 13", "Error: register not available"),
        ("reg 6 0xffffff00", "r6 (/32): 0xffffff00"),
    ]);

    let mut openocd = connect(port);
    assert_eq!(openocd.read_register(Register::Pc).unwrap(), Some(0x0800_0100));
    assert_eq!(openocd.read_register(Register::Psr).unwrap(), Some(0x0100_0004));
    assert_eq!(openocd.read_register(Register::Sp).unwrap(), None);
    openocd.write_register(Register::R6, 0xffff_ff00).unwrap();
    drop(openocd);

    assert_eq!(server.join().unwrap().len(), 4);
}

#[test]
fn test_memory_write_uses_tcl_array()
{
    let (port, server) = fake_server(vec![
        ("array unset vexcept_tcl", ""),
        ("array set vexcept_tcl { 0 0xdf00 }", ""),
        ("array2mem vexcept_tcl 16 0x20000000 1", ""),
        ("array unset vexcept_tcl", ""),
        ("array set vexcept_tcl { 0 0x0 }", ""),
        ("array2mem vexcept_tcl 32 0xe000ed08 1", ""),
    ]);

    let mut openocd = connect(port);
    openocd.write_memory(Address::new(0x2000_0000), &[0xdf00], WordWidth::Half).unwrap();
    openocd.write_word(Address::new(0xe000_ed08), 0).unwrap();
    openocd.write_memory(Address::new(0x2000_0000), &[], WordWidth::Word).unwrap();
    drop(openocd);

    assert_eq!(server.join().unwrap().len(), 6);
}

#[test]
fn test_memory_read_reorders_reply()
{
    let (port, server) = fake_server(vec![
        ("array unset vexcept_tcl", ""),
        ("mem2array vexcept_tcl 32 0x20000000 3", ""),
        ("return $vexcept_tcl", "2 3 0 1 1 2"),
    ]);

    let mut openocd = connect(port);
    let values = openocd.read_memory(Address::new(0x2000_0000), 3, WordWidth::Word).unwrap();
    assert_eq!(values, vec![1, 2, 3]);
    drop(openocd);

    server.join().unwrap();
}

#[test]
fn test_reply_split_across_segments()
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut command = Vec::new();
        reader.read_until(0x1a, &mut command).unwrap();
        writer.write_all(b"pc (/32): 0x0").unwrap();
        writer.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        writer.write_all(b"8000101\n\x1a").unwrap();
    });

    let mut openocd = connect(port);
    assert_eq!(openocd.read_register(Register::Pc).unwrap(), Some(0x0800_0101));
    server.join().unwrap();
}

#[test]
fn test_server_hangup_is_session_failure()
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let mut openocd = connect(port);
    server.join().unwrap();
    let error = openocd.halt().unwrap_err();
    assert!(matches!(error, VexceptError::SessionFailed(_) | VexceptError::Io(_)));
}

#[test]
fn test_send_after_close_fails()
{
    let (port, server) = fake_server(vec![]);
    let mut openocd = connect(port);
    openocd.close().unwrap();
    openocd.close().unwrap();
    assert!(matches!(openocd.halt(), Err(VexceptError::SessionFailed(_))));
    assert_eq!(server.join().unwrap(), vec!["exit".to_string()]);
}

#[test]
fn test_connect_refused()
{
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let error = OpenOcd::connect("127.0.0.1", port, Some(Duration::from_secs(1))).unwrap_err();
    match error {
        VexceptError::ConnectFailed { endpoint, .. } => assert_eq!(endpoint, format!("127.0.0.1:{port}")),
        other => panic!("unexpected error: {other}"),
    }
}

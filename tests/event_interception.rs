// tests/event_interception.rs

use std::io::Write;

use proptest::prelude::*;
use runvisor::events::{InterceptedWriter, event_channel};

#[test]
fn test_channel_is_fifo_and_drain_empties_it() {
    let (tx, mut rx) = event_channel();
    let tx2 = tx.clone();

    assert!(tx.send("one"));
    assert!(tx2.send("two"));
    assert!(tx.send(String::from("three")));

    assert_eq!(rx.drain(), vec!["one", "two", "three"]);
    assert!(rx.drain().is_empty());
}

#[test]
fn test_send_after_receiver_dropped_is_silently_discarded() {
    let (tx, rx) = event_channel();
    drop(rx);

    assert!(tx.is_closed());
    assert!(!tx.send("nobody listens"));
}

#[tokio::test]
async fn test_recv_ends_once_all_senders_are_gone() {
    let (tx, mut rx) = event_channel();
    tx.send("last");
    drop(tx);

    assert_eq!(rx.recv().await.as_deref(), Some("last"));
    assert_eq!(rx.recv().await, None);
}

#[test]
fn test_writes_are_forwarded_and_lines_become_events() {
    let (tx, mut rx) = event_channel();
    let mut writer = InterceptedWriter::new(Vec::new(), tx);

    writer.write_all(b"hello\nworld\n").unwrap();

    assert_eq!(writer.get_ref().as_slice(), b"hello\nworld\n");
    assert_eq!(rx.drain(), vec!["hello", "world"]);
}

#[test]
fn test_blank_lines_are_forwarded_but_not_enqueued() {
    let (tx, mut rx) = event_channel();
    let mut writer = InterceptedWriter::new(Vec::new(), tx);

    writer.write_all(b"\n   \n\t\nreal\n").unwrap();

    assert_eq!(writer.get_ref().as_slice(), b"\n   \n\t\nreal\n");
    assert_eq!(rx.drain(), vec!["real"]);
}

#[test]
fn test_line_split_across_writes_is_one_event() {
    let (tx, mut rx) = event_channel();
    let mut writer = InterceptedWriter::new(Vec::new(), tx);

    writer.write_all(b"hel").unwrap();
    assert!(rx.drain().is_empty());

    writer.write_all(b"lo\r\nnext").unwrap();
    assert_eq!(rx.drain(), vec!["hello"]);

    // The unterminated tail is emitted when the writer is unwrapped.
    let inner = writer.into_inner();
    assert_eq!(inner.as_slice(), b"hello\r\nnext");
    assert_eq!(rx.drain(), vec!["next"]);
}

#[test]
fn test_forwarded_bytes_can_be_taken_between_writes() {
    let (tx, mut rx) = event_channel();
    let mut writer = InterceptedWriter::new(Vec::new(), tx);

    writer.write_all(b"first\n").unwrap();
    assert_eq!(std::mem::take(writer.get_mut()), b"first\n");

    writer.write_all(b"second\n").unwrap();
    assert_eq!(writer.get_ref().as_slice(), b"second\n");
    assert_eq!(rx.drain(), vec!["first", "second"]);
}

#[test]
fn test_invalid_utf8_is_decoded_lossily() {
    let (tx, mut rx) = event_channel();
    let mut writer = InterceptedWriter::new(Vec::new(), tx);

    writer.write_all(b"bad \xff byte\n").unwrap();

    assert_eq!(rx.drain(), vec!["bad \u{FFFD} byte"]);
}

#[test]
fn test_reinstall_switches_sink_without_double_capture() {
    let (first_tx, mut first_rx) = event_channel();
    let (second_tx, mut second_rx) = event_channel();

    let mut writer = InterceptedWriter::new(Vec::new(), first_tx);
    writer.write_all(b"before\npartial").unwrap();

    let mut writer = writer.reinstall(second_tx);
    writer.write_all(b"after\n").unwrap();

    assert_eq!(first_rx.drain(), vec!["before", "partial"]);
    assert_eq!(second_rx.drain(), vec!["after"]);
    assert_eq!(writer.into_inner().as_slice(), b"before\npartialafter\n");
}

proptest! {
    #[test]
    fn prop_events_are_exactly_the_non_blank_lines(
        lines in proptest::collection::vec("[a-z ]{0,12}", 0..20),
        split in 1usize..7,
    ) {
        let (tx, mut rx) = event_channel();
        let mut writer = InterceptedWriter::new(Vec::new(), tx);

        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
        for chunk in text.as_bytes().chunks(split) {
            writer.write_all(chunk).unwrap();
        }

        prop_assert_eq!(writer.get_ref().as_slice(), text.as_bytes());

        let expected: Vec<String> = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect();
        prop_assert_eq!(rx.drain(), expected);
    }
}

//! Basic example of pushing values through a signal to multiple observers.
//!
//! This example demonstrates the simplest usage pattern of the signals
//! package: creating a pipe, attaching observers, and pushing values followed
//! by a completion.

use signals::{Event, Observer, Signal};

fn main() {
    println!("=== Signals Basic Example ===");

    // Create a signal together with the sink that feeds it.
    let (sink, signal) = Signal::<i32, String>::pipe();

    // Attach two observers; both see every event from here on.
    let _first = signal.observe(Observer::new(|event| match event {
        Event::Value(value) => println!("first observer got value: {value}"),
        Event::Failed(failure) => println!("first observer got failure: {failure}"),
        Event::Completed => println!("first observer: completed"),
        Event::Interrupted => println!("first observer: interrupted"),
    }));

    let _second = signal.observe(Observer::values(|value: i32| {
        println!("second observer got value: {value}");
    }));

    println!("Pushing values...");
    sink.send_value(1);
    sink.send_value(2);
    sink.send_value(3);

    println!("Completing the signal...");
    sink.send_completed();

    // The signal is terminated; further pushes are silently dropped.
    sink.send_value(4);

    println!("Example completed successfully!");
}

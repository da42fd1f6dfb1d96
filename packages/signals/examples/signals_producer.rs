//! Example of cold streams: a producer re-runs its generator for every start.
//!
//! Each observer that starts the producer gets a private run of the
//! production, with its own side effects and its own cancellation handle.

use signals::{Observer, SignalProducer};

fn main() {
    println!("=== Signals Producer Example ===");

    let producer = SignalProducer::<i32, String>::new(|sink, _resources| {
        println!("generator running");
        sink.send_value(10);
        sink.send_value(20);
        sink.send_completed();
    });

    println!("Starting first run...");
    producer.start(Observer::values(|value| {
        println!("first run got value: {value}");
    }));

    // The generator runs again, from scratch, for the second observer.
    println!("Starting second run...");
    producer.start(Observer::values(|value| {
        println!("second run got value: {value}");
    }));

    println!("Example completed successfully!");
}

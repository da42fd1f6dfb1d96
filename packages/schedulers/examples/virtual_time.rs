//! Example of deterministic timer testing with the virtual-time scheduler.
//!
//! Nothing here sleeps: the test scheduler only executes work when its clock
//! is advanced explicitly, so timer-dependent logic runs instantly and in a
//! reproducible order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use disposables::Disposable;
use schedulers::{DateScheduler, TestScheduler};

fn main() {
    println!("=== Virtual Time Example ===");

    let scheduler = TestScheduler::new();

    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);

    // A heartbeat every second, starting one second from now.
    let first = scheduler.now() + Duration::from_secs(1);
    let heartbeat = scheduler.schedule_recurring(
        first,
        Duration::from_secs(1),
        Duration::ZERO,
        Box::new(move || {
            let tick = counter.fetch_add(1, Ordering::SeqCst) + 1;
            println!("tick {tick}");
        }),
    );

    println!("Advancing the clock by 3 seconds...");
    scheduler.advance_by(Duration::from_secs(3));
    println!("ticks so far: {}", ticks.load(Ordering::SeqCst));

    println!("Cancelling the heartbeat and advancing further...");
    heartbeat.dispose();
    scheduler.advance_by(Duration::from_secs(10));
    println!("ticks after cancellation: {}", ticks.load(Ordering::SeqCst));

    println!("Example completed successfully!");
}

// Smart Insole - Pipeline Task
//
// Owns the scheduler for the life of the firmware and drives it on a fixed
// tick. Spawned as its own FreeRTOS task (std thread) so the main thread is
// free to park.

use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::STACK_PIPELINE;
use crate::drivers::{AdcReader, ImuSource};
use crate::scheduler::{Clock, PublicationScheduler, SchedulerStatus};
use crate::transport::TransportPublisher;

pub fn pipeline_task<A, I, T, C>(
    mut scheduler: PublicationScheduler<A, I, T>,
    clock: C,
    stop: Arc<AtomicBool>,
) -> SchedulerStatus
where
    A: AdcReader,
    I: ImuSource,
    T: TransportPublisher,
    C: Clock,
{
    log::info!("Pipeline task started");

    let status = scheduler.run(&clock, &stop);
    let stats = scheduler.stats();
    match status {
        SchedulerStatus::Halted => log::error!("Pipeline halted after a fatal init failure"),
        _ => log::info!(
            "Pipeline stopped: {} samples, {} skipped, {} published, {} dropped, {} failed writes",
            stats.samples,
            stats.skipped,
            stats.publishes,
            stats.publish_skips,
            stats.write_failures,
        ),
    }
    status
}

/// Run [`pipeline_task`] on a named thread.
pub fn spawn<A, I, T, C>(
    scheduler: PublicationScheduler<A, I, T>,
    clock: C,
    stop: Arc<AtomicBool>,
) -> io::Result<JoinHandle<SchedulerStatus>>
where
    A: AdcReader + Send + 'static,
    I: ImuSource + Send + 'static,
    T: TransportPublisher + Send + 'static,
    C: Clock + Send + 'static,
{
    thread::Builder::new()
        .name("pipeline".into())
        .stack_size(STACK_PIPELINE)
        .spawn(move || pipeline_task(scheduler, clock, stop))
}

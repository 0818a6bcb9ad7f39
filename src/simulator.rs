//! Represents entry point for simulator.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::config::SimulationConfig;
use crate::core::assignment::{resolve_task_assignment_policy, TaskAssignmentPolicy};
use crate::core::broker::Broker;
use crate::core::datacenter::Datacenter;
use crate::core::error::SimulationError;
use crate::core::event_queue::EventQueue;
use crate::core::events::{Event, EventData};
use crate::core::failure::FailureInjector;
use crate::core::sla::{Report, SlaEvaluator, TaskResultRow};
use crate::core::task::TaskSpec;
use crate::core::vm::Vm;
use crate::metrics::collector::MetricsCollector;
use crate::simulation_callbacks::SimulationCallbacks;
use crate::trace::generator::{generate_vms, generate_workload};

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    pub report: Report,
    /// Per-task rows in the order tasks finished.
    pub rows: Vec<TaskResultRow>,
}

pub struct CloudSimulation {
    pub config: Rc<SimulationConfig>,

    queue: EventQueue,
    pub datacenter: Datacenter,
    pub broker: Broker,
    sla_evaluator: SlaEvaluator,
    rng: Pcg64,

    /// Set once the queue has drained; stepping afterwards is an error.
    terminated: bool,

    pub metrics_collector: Rc<RefCell<MetricsCollector>>,
}

impl CloudSimulation {
    pub fn new(config: Rc<SimulationConfig>) -> Result<Self, SimulationError> {
        config.validate()?;
        info!(
            "Creating cloudlet simulation {:?} with config: {:?}",
            config.sim_name, config
        );

        let metrics_collector = Rc::new(RefCell::new(MetricsCollector::new()));

        let datacenter = Datacenter::from_host_groups(
            config.datacenter.name.clone(),
            config.datacenter.characteristics.clone(),
            config.datacenter.vm_allocation_policy,
            &config.datacenter.hosts,
        );
        let broker = Broker::new(
            resolve_task_assignment_policy(config.task_assignment_policy),
            FailureInjector::new(config.failure.probability, config.failure.length_range),
            metrics_collector.clone(),
        );

        Ok(CloudSimulation {
            queue: EventQueue::new(),
            datacenter,
            broker,
            sla_evaluator: SlaEvaluator::new(config.sla.penalty_per_violation),
            rng: Pcg64::seed_from_u64(config.seed),
            terminated: false,
            metrics_collector,
            config,
        })
    }

    /// Creates the VMs and the workload described by the config and submits them.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        self.submit_vms(generate_vms(&self.config.vms))?;
        let tasks = generate_workload(&self.config.workload, &mut self.rng);
        info!("Generated {} tasks", tasks.len());
        self.submit_tasks(tasks)
    }

    /// Places every VM in the datacenter and registers it in the broker. The first VM that
    /// cannot be placed aborts the setup.
    pub fn submit_vms(&mut self, mut vms: Vec<Vm>) -> Result<(), SimulationError> {
        for vm in vms.iter_mut() {
            let host_id = self.datacenter.allocate(vm.id(), vm.spec())?;
            vm.set_host(Some(host_id));

            let mut metrics = self.metrics_collector.borrow_mut();
            metrics.vms_created += 1;
            metrics.vm_cost += self.datacenter.characteristics().vm_cost(vm.spec());
        }
        info!("Placed {} vms", vms.len());
        self.broker.submit_vms(vms)
    }

    /// Registers tasks in the broker and schedules their arrivals. Nothing is registered if any
    /// task would arrive before the current time.
    pub fn submit_tasks(&mut self, tasks: Vec<TaskSpec>) -> Result<(), SimulationError> {
        let now = self.queue.now();
        if let Some(task) = tasks.iter().find(|task| !(task.submission_time >= now)) {
            return Err(SimulationError::InvalidSchedule {
                at: task.submission_time,
                now,
            });
        }
        self.broker.submit_tasks(&tasks)?;
        for task in tasks.iter() {
            self.queue
                .schedule(EventData::TaskArrival { task_id: task.id }, task.submission_time)?;
        }
        Ok(())
    }

    pub fn set_task_assignment_policy(&mut self, policy: Box<dyn TaskAssignmentPolicy>) {
        self.broker.set_assignment_policy(policy)
    }

    fn process_event(&mut self, event: Event) -> Result<(), SimulationError> {
        match event.data {
            EventData::TaskArrival { task_id } => {
                self.broker.admit(task_id, &mut self.rng)?;
                self.broker.assign(task_id, &mut self.queue)?;
            }
            EventData::TaskCompletion { task_id, vm_id } => {
                let task = self.broker.complete(task_id, vm_id, &mut self.queue)?;
                let cost = self
                    .datacenter
                    .characteristics()
                    .task_cost(task.actual_execution_time().unwrap_or(0.0), task.bw());
                self.metrics_collector.borrow_mut().processing_cost += cost;
            }
        }
        Ok(())
    }

    /// Processes the next event. Returns `false` when the queue has drained; stepping again after
    /// that fails with `EmptyQueue`.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        if self.terminated {
            return Err(SimulationError::EmptyQueue);
        }
        match self.queue.advance() {
            Ok(event) => {
                self.process_event(event)?;
                Ok(true)
            }
            Err(SimulationError::EmptyQueue) => {
                debug!("[{:.3}] No pending events left", self.queue.now());
                self.terminated = true;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    pub fn run_with_callbacks(
        &mut self,
        mut callbacks: Box<dyn SimulationCallbacks>,
    ) -> Result<(), SimulationError> {
        callbacks.on_simulation_start(self);

        let t = Instant::now();
        while callbacks.on_step(self) {
            if !self.step()? {
                break;
            }
        }
        self.log_throughput(t);

        callbacks.on_simulation_finish(self);
        Ok(())
    }

    pub fn run_until_no_events(&mut self) -> Result<(), SimulationError> {
        let t = Instant::now();
        while self.step()? {}
        self.log_throughput(t);
        Ok(())
    }

    fn log_throughput(&self, t: Instant) {
        let duration = t.elapsed().as_secs_f64();
        info!(
            "Processed {} events in {:.2?}s ({:.0} events/s)",
            self.event_count(),
            duration,
            self.event_count() as f64 / duration
        );
        info!("Finished at {}", self.time());
    }

    /// Destroys all VMs and evaluates every finished task against its deadline.
    pub fn finish(&mut self) -> Result<SimulationResult, SimulationError> {
        for vm in self.broker.take_vms() {
            self.datacenter.release(vm.id())?;
            self.metrics_collector.borrow_mut().vms_destroyed += 1;
        }

        let finished = self.broker.collect_finished()?;
        let deadlines = self.broker.deadlines();
        let report = self.sla_evaluator.evaluate(&finished, deadlines)?;
        let rows = self.sla_evaluator.result_rows(&finished, deadlines)?;
        info!(
            "Tasks: {} total, {} succeeded, {} failed, {} sla violations, penalty {}",
            report.total_tasks,
            report.success_count,
            report.failure_count,
            report.violation_count,
            report.total_penalty
        );
        Ok(SimulationResult { report, rows })
    }

    pub fn time(&self) -> f64 {
        self.queue.now()
    }

    pub fn event_count(&self) -> u64 {
        self.queue.processed_count()
    }

    /// Time of the next event to be processed, if any.
    pub fn next_event_time(&mut self) -> Option<f64> {
        self.queue.peek_time()
    }

    pub fn pending_events(&self) -> usize {
        self.queue.pending_count()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

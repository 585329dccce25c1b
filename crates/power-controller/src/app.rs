//! Application Wiring
//!
//! Builds the routing tables and the task table over a [`Board`].

use crate::board::{modules, Board};
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::sys;
use message_router::{MessageRouter, MessageRouterConfig, ModuleId, ModuleTable};
use scheduler::{ScheduledTask, Scheduler, StopHandle};
use soft_timer::Timebase;
use tracing::{debug, error, info, warn};

/// Router and board, the context the scheduler runs tasks on
#[derive(Debug)]
pub struct App {
    pub router: MessageRouter<Board>,
    pub board: Board,
}

impl App {
    /// Initialise the board and register every module with the router
    pub fn init(config: &ControllerConfig, timebase: Timebase) -> Result<Self, ControllerError> {
        let board = Board::init(config, timebase)?;
        let router = MessageRouter::init(ModuleId(modules::ROUTER), Self::module_tables())?;
        info!("Message router ready with {} modules", router.module_count());
        Ok(Self { router, board })
    }

    /// Routing table of the board
    pub fn module_tables() -> MessageRouterConfig<Board> {
        MessageRouterConfig::new(vec![
            ModuleTable::new(modules::SYS, "Sys", sys::command_table()),
            ModuleTable::new(
                modules::ERROR_MANAGER,
                "ErrorManager",
                error_manager::command_table(),
            ),
            ModuleTable::new(modules::SERIAL, "Serial", serial_protocol::command_table()),
        ])
    }

    /// Task table of the board
    pub fn tasks(config: &ControllerConfig) -> Vec<ScheduledTask<App>> {
        vec![
            ScheduledTask::new("serial_update", config.tasks.serial_update_ms, serial_update),
            ScheduledTask::new("status", config.tasks.status_ms, status),
        ]
    }

    /// Scheduler over [`App::tasks`], driven by `timebase`
    pub fn scheduler(
        config: &ControllerConfig,
        timebase: Timebase,
    ) -> Result<Scheduler<App>, ControllerError> {
        Ok(Scheduler::init(
            config.scheduler.clone(),
            Self::tasks(config),
            timebase,
        )?)
    }

    /// Log critical errors and, with `shutdown` set, end the main loop
    pub fn install_critical_hook(&mut self, stop: StopHandle, shutdown: bool) {
        self.board.errors.set_critical_hook(Box::new(move |id| {
            error!("Critical error {} raised", id);
            if shutdown {
                warn!("Stopping main loop after critical error");
                stop.stop();
            }
        }));
    }
}

/// Serve one frame per serial channel
pub fn serial_update(app: &mut App) {
    serial_protocol::update(&app.router, &mut app.board);
}

/// Periodic status line
pub fn status(app: &mut App) {
    let board = &app.board;
    debug!(
        "Uptime {} ms, error flags 0x{:08X}, critical {}",
        board.timebase.uptime_ms(),
        board.errors.error_flags(),
        board.errors.do_any_critical_errors_exist()
    );
    for index in 0..board.serial.channel_count() {
        if let Ok(channel) = board.serial.channel(index) {
            debug!("Channel {}: {:?}", index, channel.statistics());
        }
    }
}

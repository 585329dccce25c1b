//! Router Implementation

use crate::error::RouterError;
use crate::message::{CommandId, Message, ModuleId, ResponseCode};
use std::collections::HashSet;
use tracing::{debug, info};

/// A command handler. Receives the shared firmware context and the message,
/// and must run the size guard before reading the command payload.
pub type MessageHandler<C> = fn(&mut C, &mut Message);

/// One `(command id, handler)` row
pub struct CommandTableItem<C> {
    /// Command id matched against the message header
    pub command_id: CommandId,
    /// Handler, `None` for a reserved command that accepts and ignores requests
    pub handler: Option<MessageHandler<C>>,
}

impl<C> CommandTableItem<C> {
    pub const fn new(command_id: u16, handler: MessageHandler<C>) -> Self {
        Self {
            command_id: CommandId(command_id),
            handler: Some(handler),
        }
    }

    /// Row without a handler
    pub const fn reserved(command_id: u16) -> Self {
        Self {
            command_id: CommandId(command_id),
            handler: None,
        }
    }
}

impl<C> Clone for CommandTableItem<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for CommandTableItem<C> {}

impl<C> std::fmt::Debug for CommandTableItem<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTableItem")
            .field("command_id", &self.command_id)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Command table of one module
pub struct ModuleTable<C> {
    /// Module id matched against the message header
    pub module_id: ModuleId,
    /// Name used in logs
    pub name: &'static str,
    /// Commands, searched in order
    pub commands: Vec<CommandTableItem<C>>,
}

impl<C> ModuleTable<C> {
    pub fn new(module_id: u16, name: &'static str, commands: Vec<CommandTableItem<C>>) -> Self {
        Self {
            module_id: ModuleId(module_id),
            name,
            commands,
        }
    }

    fn find_command(&self, command_id: CommandId) -> Option<&CommandTableItem<C>> {
        self.commands.iter().find(|c| c.command_id == command_id)
    }
}

impl<C> std::fmt::Debug for ModuleTable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTable")
            .field("module_id", &self.module_id)
            .field("name", &self.name)
            .field("commands", &self.commands.len())
            .finish()
    }
}

/// Every module the router dispatches to
pub struct MessageRouterConfig<C> {
    pub modules: Vec<ModuleTable<C>>,
}

impl<C> MessageRouterConfig<C> {
    pub fn new(modules: Vec<ModuleTable<C>>) -> Self {
        Self { modules }
    }
}

impl<C> Default for MessageRouterConfig<C> {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
        }
    }
}

/// Table-driven dispatcher over a context `C`.
///
/// Tables are fixed once the router is built. Lookup is a linear search over
/// modules and then over the matching module's commands.
pub struct MessageRouter<C> {
    module_id: ModuleId,
    modules: Vec<ModuleTable<C>>,
}

impl<C> MessageRouter<C> {
    /// Build a router that identifies itself as `module_id`.
    ///
    /// Fails on a duplicate module id, or on a duplicate command id within
    /// one module.
    pub fn init(module_id: ModuleId, config: MessageRouterConfig<C>) -> Result<Self, RouterError> {
        let mut seen_modules = HashSet::new();
        for module in &config.modules {
            if !seen_modules.insert(module.module_id) {
                return Err(RouterError::DuplicateModule(module.module_id));
            }

            let mut seen_commands = HashSet::new();
            for command in &module.commands {
                if !seen_commands.insert(command.command_id) {
                    return Err(RouterError::DuplicateCommand {
                        module: module.module_id,
                        command: command.command_id,
                    });
                }
            }
        }

        info!(
            "Message router {} initialized with {} modules",
            module_id,
            config.modules.len()
        );

        Ok(Self {
            module_id,
            modules: config.modules,
        })
    }

    /// The router's own module id
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    /// Number of registered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Look up a module by id
    pub fn module(&self, module_id: ModuleId) -> Option<&ModuleTable<C>> {
        self.modules.iter().find(|m| m.module_id == module_id)
    }

    /// Dispatch `message` to its handler.
    ///
    /// The response is emptied and the code is set at each lookup step, so an
    /// unmatched module leaves `InvalidModuleId`, an unmatched command leaves
    /// `InvalidCommandId` and a match leaves `None` for the handler to
    /// overwrite. No handler runs unless both ids match.
    pub fn process_message(&self, ctx: &mut C, message: &mut Message) {
        let header = message.header;
        message.response_mut().clear();
        message.set_response_code(ResponseCode::InvalidModuleId);

        let Some(module) = self.module(header.module_id) else {
            debug!("No module {} for message {}", header.module_id, header.message_id);
            return;
        };

        message.set_response_code(ResponseCode::InvalidCommandId);
        let Some(command) = module.find_command(header.command_id) else {
            debug!(
                "Module {} has no command {}",
                module.name, header.command_id
            );
            return;
        };

        message.set_response_code(ResponseCode::None);
        if let Some(handler) = command.handler {
            handler(ctx, message);
        }

        debug!(
            "Message {} to {}/{} done: {}",
            header.message_id,
            module.name,
            header.command_id,
            message.response_code()
        );
    }
}

impl<C> std::fmt::Debug for MessageRouter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("module_id", &self.module_id)
            .field("modules", &self.modules)
            .finish()
    }
}

//! Router Commands

use crate::manager::{ErrorDetailItem, ErrorDetails, ErrorId, ErrorManager};
use message_router::{
    respond_with, try_respond_with, CommandTableItem, Message, ModuleId, Payload, PayloadReader,
    PayloadWriter, ResponseCode,
};

/// Command ids of the error manager module
pub mod commands {
    pub const GET_ERROR_STATE: u16 = 0x01;
    pub const SET_ERROR_STATE: u16 = 0x02;
    pub const DO_ERRORS_EXIST: u16 = 0x03;
    pub const CLEAR_ALL_ERRORS: u16 = 0x04;
    pub const GET_ALL_ERRORS: u16 = 0x05;
    pub const GET_ERROR_DETAILS: u16 = 0x06;
    pub const SET_ERROR_ENABLED: u16 = 0x07;
}

fn error_id(index: u16) -> ErrorId {
    ErrorId(u8::try_from(index).unwrap_or(u8::MAX))
}

/// `{index, state}` pair used by get and set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorStateResponse {
    pub index: u16,
    pub state: u16,
}

impl Payload for ErrorStateResponse {
    const SIZE: usize = 4;

    fn read_from(bytes: &[u8]) -> Self {
        let mut r = PayloadReader::new(bytes);
        Self {
            index: r.u16(),
            state: r.u16(),
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        PayloadWriter::new(out).u16(self.index).u16(self.state);
    }
}

/// Reply of `GetErrorDetails`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorDetailsResponse {
    pub index: u16,
    pub details: ErrorDetails,
}

fn read_item(r: &mut PayloadReader<'_>) -> ErrorDetailItem {
    ErrorDetailItem {
        timestamp: r.u32(),
        age: r.u32(),
        module_id: ModuleId(r.u16()),
        state: r.u16() != 0,
    }
}

fn write_item(w: &mut PayloadWriter<'_>, item: &ErrorDetailItem) {
    w.u32(item.timestamp)
        .u32(item.age)
        .u16(item.module_id.0)
        .u16(item.state.into());
}

impl Payload for ErrorDetailsResponse {
    const SIZE: usize = 2 + 12 + 12 + 2 + 2;

    fn read_from(bytes: &[u8]) -> Self {
        let mut r = PayloadReader::new(bytes);
        let index = r.u16();
        let current = read_item(&mut r);
        let previous = read_item(&mut r);
        Self {
            index,
            details: ErrorDetails {
                current,
                previous,
                is_enabled: r.u16() != 0,
                is_critical: r.u16() != 0,
            },
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        let mut w = PayloadWriter::new(out);
        w.u16(self.index);
        write_item(&mut w, &self.details.current);
        write_item(&mut w, &self.details.previous);
        w.u16(self.details.is_enabled.into())
            .u16(self.details.is_critical.into());
    }
}

fn get_error_state<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    respond_with(message, |index: u16| ErrorStateResponse {
        index,
        state: errors.get_error_state(error_id(index)).into(),
    });
}

fn set_error_state<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    respond_with(message, |command: ErrorStateResponse| {
        let caller = errors.module_id();
        errors.set_error_state(caller, error_id(command.index), command.state != 0);
    });
}

fn do_errors_exist<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    respond_with(message, |()| u16::from(errors.do_any_errors_exist()));
}

fn clear_all_errors<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    respond_with(message, |()| {
        let caller = errors.module_id();
        errors.clear_all_errors(caller);
    });
}

fn get_all_errors<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    respond_with(message, |()| errors.error_flags());
}

fn get_error_details<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    try_respond_with(message, |index: u16| {
        errors
            .get_error_details(error_id(index))
            .map(|details| ErrorDetailsResponse { index, details })
            .ok_or(ResponseCode::InternalError)
    });
}

fn set_error_enabled<C: AsMut<ErrorManager>>(ctx: &mut C, message: &mut Message) {
    let errors = ctx.as_mut();
    try_respond_with(message, |command: ErrorStateResponse| {
        errors
            .set_error_enabled(error_id(command.index), command.state != 0)
            .map_err(|_| ResponseCode::InternalError)
    });
}

/// Command table of the error manager module
pub fn command_table<C: AsMut<ErrorManager>>() -> Vec<CommandTableItem<C>> {
    vec![
        CommandTableItem::new(commands::GET_ERROR_STATE, get_error_state::<C>),
        CommandTableItem::new(commands::SET_ERROR_STATE, set_error_state::<C>),
        CommandTableItem::new(commands::DO_ERRORS_EXIST, do_errors_exist::<C>),
        CommandTableItem::new(commands::CLEAR_ALL_ERRORS, clear_all_errors::<C>),
        CommandTableItem::new(commands::GET_ALL_ERRORS, get_all_errors::<C>),
        CommandTableItem::new(commands::GET_ERROR_DETAILS, get_error_details::<C>),
        CommandTableItem::new(commands::SET_ERROR_ENABLED, set_error_enabled::<C>),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ErrorManagerConfig;
    use message_router::{MessageHeader, MessageRouter, MessageRouterConfig, ModuleTable};
    use soft_timer::Timebase;

    const MODULE: u16 = 0x02;

    struct Board {
        errors: ErrorManager,
    }

    impl AsMut<ErrorManager> for Board {
        fn as_mut(&mut self) -> &mut ErrorManager {
            &mut self.errors
        }
    }

    fn setup() -> (MessageRouter<Board>, Board, Timebase) {
        let clock = Timebase::new();
        let config = ErrorManagerConfig {
            error_count: 6,
            critical_errors: vec![ErrorId(1)],
        };
        let board = Board {
            errors: ErrorManager::init(ModuleId(MODULE), config, clock.clone()).unwrap(),
        };
        let router = MessageRouter::init(
            ModuleId(0),
            MessageRouterConfig::new(vec![ModuleTable::new(MODULE, "errors", command_table())]),
        )
        .unwrap();
        (router, board, clock)
    }

    fn call(router: &MessageRouter<Board>, board: &mut Board, command: u16, data: &[u8]) -> Message {
        let mut message = Message::with_command(MessageHeader::new(MODULE, command, 1), data).unwrap();
        router.process_message(board, &mut message);
        message
    }

    #[test]
    fn test_set_then_get_state() {
        let (router, mut board, _) = setup();
        let reply = call(&router, &mut board, commands::SET_ERROR_STATE, &[3, 0, 1, 0]);
        assert_eq!(reply.response_code(), ResponseCode::None);
        assert!(reply.response().is_empty());

        let reply = call(&router, &mut board, commands::GET_ERROR_STATE, &[3, 0]);
        assert_eq!(reply.response_data(), &[3, 0, 1, 0]);

        let reply = call(&router, &mut board, commands::GET_ALL_ERRORS, &[]);
        assert_eq!(reply.response_data(), &0b1000u32.to_le_bytes());

        let reply = call(&router, &mut board, commands::DO_ERRORS_EXIST, &[]);
        assert_eq!(reply.response_data(), &[1, 0]);
    }

    #[test]
    fn test_clear_all_errors_command() {
        let (router, mut board, _) = setup();
        call(&router, &mut board, commands::SET_ERROR_STATE, &[0, 0, 1, 0]);
        call(&router, &mut board, commands::SET_ERROR_STATE, &[1, 0, 1, 0]);
        assert!(board.errors.do_any_critical_errors_exist());

        let reply = call(&router, &mut board, commands::CLEAR_ALL_ERRORS, &[]);
        assert_eq!(reply.response_code(), ResponseCode::None);
        assert_eq!(board.errors.error_flags(), 0);
    }

    #[test]
    fn test_error_details_command() {
        let (router, mut board, clock) = setup();
        clock.set(40);
        call(&router, &mut board, commands::SET_ERROR_STATE, &[1, 0, 1, 0]);
        clock.set(100);

        let reply = call(&router, &mut board, commands::GET_ERROR_DETAILS, &[1, 0]);
        assert_eq!(reply.response().len(), ErrorDetailsResponse::SIZE);
        let decoded = ErrorDetailsResponse::read_from(reply.response_data());
        assert_eq!(decoded.index, 1);
        assert_eq!(decoded.details.current.timestamp, 40);
        assert_eq!(decoded.details.current.age, 60);
        assert_eq!(decoded.details.current.module_id, ModuleId(MODULE));
        assert!(decoded.details.current.state);
        assert!(decoded.details.is_critical);
        assert!(decoded.details.is_enabled);
    }

    #[test]
    fn test_error_details_unknown_index() {
        let (router, mut board, _) = setup();
        let reply = call(&router, &mut board, commands::GET_ERROR_DETAILS, &[9, 0]);
        assert_eq!(reply.response_code(), ResponseCode::InternalError);
        assert!(reply.response().is_empty());
    }

    #[test]
    fn test_set_error_enabled_command() {
        let (router, mut board, _) = setup();
        let reply = call(&router, &mut board, commands::SET_ERROR_ENABLED, &[2, 0, 0, 0]);
        assert_eq!(reply.response_code(), ResponseCode::None);
        call(&router, &mut board, commands::SET_ERROR_STATE, &[2, 0, 1, 0]);
        assert!(!board.errors.get_error_state(ErrorId(2)));

        let reply = call(&router, &mut board, commands::SET_ERROR_ENABLED, &[1, 0, 0, 0]);
        assert_eq!(reply.response_code(), ResponseCode::InternalError);
    }

    #[test]
    fn test_wrong_command_size() {
        let (router, mut board, _) = setup();
        let reply = call(&router, &mut board, commands::SET_ERROR_STATE, &[3, 0, 1]);
        assert_eq!(reply.response_code(), ResponseCode::InvalidCommandLength);
        assert_eq!(board.errors.error_flags(), 0);
    }
}

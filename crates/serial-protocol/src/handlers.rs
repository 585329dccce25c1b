//! Scheduler Task and Router Commands

use crate::channel::{Inbound, SerialPorts};
use message_router::{
    try_respond_with, CommandTableItem, Message, MessageRouter, Payload, PayloadReader,
    PayloadWriter, ResponseCode,
};

/// Command ids of the serial module
pub mod commands {
    pub const GET_SERIAL_STATISTICS: u16 = 0x01;
    pub const RESET_SERIAL_STATISTICS: u16 = 0x02;
}

/// Process at most one frame per channel and queue its reply.
///
/// This is the periodic serial task: received commands go through `router`
/// with the whole context, so handlers of any module are reachable.
pub fn update<C: AsMut<SerialPorts>>(router: &MessageRouter<C>, ctx: &mut C) {
    let count = ctx.as_mut().channel_count();
    for index in 0..count {
        let Some(inbound) = ctx.as_mut().poll(index) else {
            continue;
        };

        let message = match inbound {
            Inbound::Command(mut message) => {
                router.process_message(ctx, &mut message);
                message
            }
            Inbound::Rejected(message) => message,
        };
        ctx.as_mut().respond(index, &message);
    }
}

/// Reply of `GetSerialStatistics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsResponse {
    pub bytes_sent: u32,
    pub bytes_received: u32,
    pub messages_sent: u32,
    pub messages_received: u32,
    pub ms_since_last_message: u32,
}

impl Payload for StatisticsResponse {
    const SIZE: usize = 20;

    fn read_from(bytes: &[u8]) -> Self {
        let mut r = PayloadReader::new(bytes);
        Self {
            bytes_sent: r.u32(),
            bytes_received: r.u32(),
            messages_sent: r.u32(),
            messages_received: r.u32(),
            ms_since_last_message: r.u32(),
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        PayloadWriter::new(out)
            .u32(self.bytes_sent)
            .u32(self.bytes_received)
            .u32(self.messages_sent)
            .u32(self.messages_received)
            .u32(self.ms_since_last_message);
    }
}

fn get_serial_statistics<C: AsMut<SerialPorts>>(ctx: &mut C, message: &mut Message) {
    let ports = ctx.as_mut();
    try_respond_with(message, |channel: u16| {
        let channel_ref = ports
            .channel(channel.into())
            .map_err(|_| ResponseCode::InternalError)?;
        let stats = channel_ref.statistics();
        Ok(StatisticsResponse {
            bytes_sent: stats.bytes_sent,
            bytes_received: stats.bytes_received,
            messages_sent: stats.messages_sent,
            messages_received: stats.messages_received,
            ms_since_last_message: channel_ref.ms_since_last_message(ports.timebase()),
        })
    });
}

fn reset_serial_statistics<C: AsMut<SerialPorts>>(ctx: &mut C, message: &mut Message) {
    let ports = ctx.as_mut();
    try_respond_with(message, |channel: u16| {
        ports
            .channel_mut(channel.into())
            .map(|c| c.reset_statistics())
            .map_err(|_| ResponseCode::InternalError)
    });
}

/// Command table of the serial module
pub fn command_table<C: AsMut<SerialPorts>>() -> Vec<CommandTableItem<C>> {
    vec![
        CommandTableItem::new(commands::GET_SERIAL_STATISTICS, get_serial_statistics::<C>),
        CommandTableItem::new(commands::RESET_SERIAL_STATISTICS, reset_serial_statistics::<C>),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SerialStatistics;
    use crate::codec::{decode_response, encode_command};
    use crate::config::SerialConfig;
    use crate::consts::RESPONSE_MAX_SIZE;
    use message_router::{MessageHeader, MessageRouterConfig, ModuleId, ModuleTable};
    use soft_timer::Timebase;

    const SERIAL_MODULE: u16 = 0x04;

    struct Board {
        ports: SerialPorts,
    }

    impl AsMut<SerialPorts> for Board {
        fn as_mut(&mut self) -> &mut SerialPorts {
            &mut self.ports
        }
    }

    fn setup(channel_count: usize) -> (MessageRouter<Board>, Board, Timebase) {
        let clock = Timebase::new();
        let config = SerialConfig {
            channel_count,
            ..Default::default()
        };
        let board = Board {
            ports: SerialPorts::init(config, clock.clone()).unwrap(),
        };
        let router = MessageRouter::init(
            ModuleId(0),
            MessageRouterConfig::new(vec![ModuleTable::new(
                SERIAL_MODULE,
                "serial",
                command_table(),
            )]),
        )
        .unwrap();
        (router, board, clock)
    }

    fn send(board: &Board, channel: usize, command: u16, id: u16, data: &[u8]) {
        let mut out = [0u8; RESPONSE_MAX_SIZE];
        let header = MessageHeader::new(SERIAL_MODULE, command, id);
        let len = encode_command(&header, data, 0, &mut out).unwrap();
        board.ports.channel(channel).unwrap().push_rx(&out[..len]);
    }

    fn receive(board: &Board, channel: usize) -> (MessageHeader, Vec<u8>) {
        let mut out = [0u8; 128];
        let len = board.ports.channel(channel).unwrap().pop_tx(&mut out);
        decode_response(&out[..len], board.ports.config()).unwrap()
    }

    #[test]
    fn test_get_statistics_over_the_wire() {
        let (router, mut board, clock) = setup(1);
        send(&board, 0, commands::GET_SERIAL_STATISTICS, 1, &[0, 0]);
        clock.advance(5);
        update(&router, &mut board);

        let (header, data) = receive(&board, 0);
        assert_eq!(header.message_id.0, 1);
        let stats = StatisticsResponse::read_from(&data);
        assert_eq!(data.len(), StatisticsResponse::SIZE);
        assert_eq!(stats.messages_received, 1);
        assert_eq!(stats.bytes_received, 18);
        // Reply is counted only after the handler ran
        assert_eq!(stats.messages_sent, 0);
    }

    #[test]
    fn test_invalid_channel_index() {
        let (router, mut board, _) = setup(1);
        send(&board, 0, commands::GET_SERIAL_STATISTICS, 2, &[7, 0]);
        update(&router, &mut board);

        let (_, data) = receive(&board, 0);
        assert!(data.is_empty());
        assert_eq!(
            board.ports.channel(0).unwrap().last_response_code(),
            ResponseCode::InternalError
        );
    }

    #[test]
    fn test_reset_other_channel() {
        let (router, mut board, _) = setup(2);
        send(&board, 1, commands::GET_SERIAL_STATISTICS, 1, &[1, 0]);
        update(&router, &mut board);
        receive(&board, 1);
        assert_eq!(board.ports.channel(1).unwrap().statistics().messages_sent, 1);

        send(&board, 0, commands::RESET_SERIAL_STATISTICS, 2, &[1, 0]);
        update(&router, &mut board);
        let (header, data) = receive(&board, 0);
        assert_eq!(header.command_id.0, commands::RESET_SERIAL_STATISTICS);
        assert!(data.is_empty());
        assert_eq!(
            board.ports.channel(1).unwrap().statistics(),
            SerialStatistics::default()
        );
    }

    #[test]
    fn test_unknown_module_gets_empty_reply() {
        let (router, mut board, _) = setup(1);
        let mut out = [0u8; RESPONSE_MAX_SIZE];
        let header = MessageHeader::new(0x33, 0x01, 9);
        let len = encode_command(&header, &[], 0, &mut out).unwrap();
        board.ports.channel(0).unwrap().push_rx(&out[..len]);
        update(&router, &mut board);

        let (reply, data) = receive(&board, 0);
        assert_eq!(reply, header);
        assert!(data.is_empty());
        assert_eq!(
            board.ports.channel(0).unwrap().last_response_code(),
            ResponseCode::InvalidModuleId
        );
    }
}

//! Sys Module
//!
//! Identity and uptime queries answered from the board context.

use crate::board::Board;
use crate::config::ApplicationVersion;
use message_router::{respond_with, CommandTableItem, Message, Payload, PayloadReader, PayloadWriter};

/// Command ids of the Sys module
pub mod commands {
    pub const GET_APPLICATION_VERSION: u16 = 0x01;
    pub const GET_PRODUCT_ID: u16 = 0x02;
    pub const GET_PRODUCT_NAME: u16 = 0x03;
    pub const RESET: u16 = 0x04;
    pub const GET_RESET_REASON: u16 = 0x05;
    pub const GET_UPTIME_MILLISECONDS: u16 = 0x06;
}

/// Length of the product name field, NUL padded
pub const PRODUCT_NAME_SIZE: usize = 20;

impl Payload for ApplicationVersion {
    const SIZE: usize = 6;

    fn read_from(bytes: &[u8]) -> Self {
        let mut r = PayloadReader::new(bytes);
        Self {
            major: r.u16(),
            minor: r.u16(),
            build: r.u16(),
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        PayloadWriter::new(out)
            .u16(self.major)
            .u16(self.minor)
            .u16(self.build);
    }
}

/// Name field as sent on the wire; always keeps a terminating NUL
pub fn product_name_field(name: &str) -> [u8; PRODUCT_NAME_SIZE] {
    let mut field = [0u8; PRODUCT_NAME_SIZE];
    let len = name.len().min(PRODUCT_NAME_SIZE - 1);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    field
}

fn get_application_version(board: &mut Board, message: &mut Message) {
    let version = board.product.version;
    respond_with(message, |()| version);
}

fn get_product_id(board: &mut Board, message: &mut Message) {
    let id = board.product.product_id;
    respond_with(message, |()| id);
}

fn get_product_name(board: &mut Board, message: &mut Message) {
    let field = product_name_field(&board.product.product_name);
    respond_with(message, |()| field);
}

fn get_uptime_milliseconds(board: &mut Board, message: &mut Message) {
    let uptime = board.timebase.uptime_ms();
    respond_with(message, |()| uptime);
}

/// Command table of the Sys module. Reset and reset reason need the MCU.
pub fn command_table() -> Vec<CommandTableItem<Board>> {
    vec![
        CommandTableItem::new(commands::GET_APPLICATION_VERSION, get_application_version),
        CommandTableItem::new(commands::GET_PRODUCT_ID, get_product_id),
        CommandTableItem::new(commands::GET_PRODUCT_NAME, get_product_name),
        CommandTableItem::reserved(commands::RESET),
        CommandTableItem::reserved(commands::GET_RESET_REASON),
        CommandTableItem::new(commands::GET_UPTIME_MILLISECONDS, get_uptime_milliseconds),
    ]
}

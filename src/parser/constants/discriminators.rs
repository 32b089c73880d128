//! 原生程序指令 discriminator 常量
//!
//! System Program 使用 4 字节 little-endian 指令号，SPL Token 使用 1 字节

pub mod system {
    /// System Program 指令号 (u32 LE, offset 0)
    pub const CREATE_ACCOUNT: u32 = 0;
    pub const TRANSFER: u32 = 2;

    /// Transfer: opcode(4) + lamports(8)
    pub const TRANSFER_LEN: usize = 12;
    /// CreateAccount: opcode(4) + lamports(8) + space(8) + owner(32)
    pub const CREATE_ACCOUNT_LEN: usize = 52;
}

pub mod spl_token {
    /// SPL Token 指令号 (u8, offset 0)
    pub const TRANSFER: u8 = 3;
    pub const MINT_TO: u8 = 7;
    pub const BURN: u8 = 8;
    pub const CLOSE_ACCOUNT: u8 = 9;
    pub const TRANSFER_CHECKED: u8 = 12;

    /// Transfer / MintTo / Burn: opcode(1) + amount(8)
    pub const AMOUNT_LEN: usize = 9;
    /// TransferChecked: opcode(1) + amount(8) + decimals(1)
    pub const TRANSFER_CHECKED_LEN: usize = 10;
}

pub mod associated_token {
    /// Create / CreateIdempotent 的账户顺序: payer, associated account, wallet, mint, ...
    pub const ASSOCIATED_ACCOUNT_INDEX: usize = 1;
}

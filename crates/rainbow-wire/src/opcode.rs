use thiserror::Error;

/// Commands the console CPU sends to the chip.
///
/// The numbering is part of the wire protocol; reserved members are kept so
/// the values of the live ones stay put.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    GetEspStatus = 0,
    DebugLog = 1,
    ClearBuffers = 2,
    GetWifiStatus = 3,
    /// Reserved.
    GetRndByte = 4,
    /// Reserved.
    GetRndByteRange = 5,
    /// Reserved.
    GetRndWord = 6,
    /// Reserved.
    GetRndWordRange = 7,
    GetServerStatus = 8,
    ConnectToServer = 9,
    DisconnectFromServer = 10,
    SendMessageToServer = 11,
    /// Reserved.
    SendMessageToGame = 12,
    FileOpen = 13,
    FileClose = 14,
    FileExists = 15,
    FileDelete = 16,
    FileSetCur = 17,
    FileRead = 18,
    FileWrite = 19,
    FileAppend = 20,
    GetFileList = 21,
}

/// Opcodes of response frames the chip sends back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Reply {
    Ready = 0,
    FileExists = 1,
    FileList = 2,
    FileData = 3,
    WifiStatus = 4,
    ServerStatus = 5,
    /// Reserved.
    RndByte = 6,
    /// Reserved.
    RndWord = 7,
    MessageFromServer = 8,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("unknown command opcode {0:#04x}")]
pub struct UnknownCommand(pub u8);

impl TryFrom<u8> for Command {
    type Error = UnknownCommand;

    fn try_from(value: u8) -> Result<Self, UnknownCommand> {
        Ok(match value {
            0 => Self::GetEspStatus,
            1 => Self::DebugLog,
            2 => Self::ClearBuffers,
            3 => Self::GetWifiStatus,
            4 => Self::GetRndByte,
            5 => Self::GetRndByteRange,
            6 => Self::GetRndWord,
            7 => Self::GetRndWordRange,
            8 => Self::GetServerStatus,
            9 => Self::ConnectToServer,
            10 => Self::DisconnectFromServer,
            11 => Self::SendMessageToServer,
            12 => Self::SendMessageToGame,
            13 => Self::FileOpen,
            14 => Self::FileClose,
            15 => Self::FileExists,
            16 => Self::FileDelete,
            17 => Self::FileSetCur,
            18 => Self::FileRead,
            19 => Self::FileWrite,
            20 => Self::FileAppend,
            21 => Self::GetFileList,
            other => return Err(UnknownCommand(other)),
        })
    }
}

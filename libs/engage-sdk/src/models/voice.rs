use std::time::Duration;

use crate::models::{CustomerNumber, MessagingChannelNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextToSpeechVoice {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SayAction {
    pub text: String,
    pub play_beep: bool,
    pub voice: TextToSpeechVoice,
}

impl SayAction {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            play_beep: false,
            voice: TextToSpeechVoice::default(),
        }
    }
}

/// What the caller hears before input is collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoicePrompt {
    Say(SayAction),
    Play { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetDigitsAction {
    pub prompt: Option<VoicePrompt>,
    pub timeout: Option<Duration>,
    pub finish_on_key: Option<String>,
    pub num_digits: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct GetRecordingAction {
    pub prompt: Option<VoicePrompt>,
    pub timeout: Option<Duration>,
    pub max_length: Option<Duration>,
    pub finish_on_key: Option<String>,
    pub play_beep: bool,
    pub trim_silence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DialAction {
    pub customer_numbers: Vec<CustomerNumber>,
    pub record: bool,
    pub sequential: bool,
    pub ringback_tone: Option<String>,
    pub caller_id: Option<String>,
    pub max_duration: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnqueueAction {
    pub hold_music: Option<String>,
    pub queue_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DequeueAction {
    pub channel_number: MessagingChannelNumber,
    pub record: bool,
    pub queue_name: Option<String>,
}

/// One step of a voice call dial plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceAction {
    Say(SayAction),
    Play { url: String },
    GetDigits(GetDigitsAction),
    Dial(DialAction),
    RecordSession,
    GetRecording(GetRecordingAction),
    Enqueue(EnqueueAction),
    Dequeue(DequeueAction),
    Reject,
    Redirect { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceCallDirection {
    Inbound,
    Outbound,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceCallStatus {
    Queued,
    Answered,
    Ringing,
    Active,
    Dialing,
    DialCompleted,
    Bridged,
    Enqueued,
    Dequeued,
    Transferred,
    Completed,
    InsufficientCredit,
    NotAnswered,
    InvalidPhoneNumber,
    ApplicationError,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceCallHangupCause {
    NormalClearing,
    UserBusy,
    NoAnswer,
    CallRejected,
    UnallocatedNumber,
    RecoveryOnTimerExpire,
    Unknown,
}

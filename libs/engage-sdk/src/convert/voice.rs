use crate::convert::{duration_to_wire, optional_duration, required};
use crate::error::ConversionError;
use crate::models::{
    CustomerNumber, DequeueAction, DialAction, EnqueueAction, GetDigitsAction, GetRecordingAction,
    SayAction, TextToSpeechVoice, VoiceAction, VoiceCallDirection, VoiceCallHangupCause,
    VoiceCallStatus, VoicePrompt,
};
use crate::proto;

impl From<TextToSpeechVoice> for proto::TextToSpeechVoice {
    fn from(voice: TextToSpeechVoice) -> Self {
        match voice {
            TextToSpeechVoice::Male => Self::Male,
            TextToSpeechVoice::Female => Self::Female,
        }
    }
}

impl From<i32> for TextToSpeechVoice {
    fn from(value: i32) -> Self {
        match proto::TextToSpeechVoice::try_from(value) {
            Ok(proto::TextToSpeechVoice::Female) => Self::Female,
            _ => Self::Male,
        }
    }
}

impl From<&SayAction> for proto::SayCallAction {
    fn from(say: &SayAction) -> Self {
        Self {
            text: say.text.clone(),
            play_beep: say.play_beep,
            voice: proto::TextToSpeechVoice::from(say.voice).into(),
        }
    }
}

impl From<proto::SayCallAction> for SayAction {
    fn from(wire: proto::SayCallAction) -> Self {
        Self {
            text: wire.text,
            play_beep: wire.play_beep,
            voice: wire.voice.into(),
        }
    }
}

fn digits_prompt(prompt: Option<&VoicePrompt>) -> Option<proto::get_digits_call_action::Prompt> {
    use proto::get_digits_call_action::Prompt;

    prompt.map(|p| match p {
        VoicePrompt::Say(say) => Prompt::Say(say.into()),
        VoicePrompt::Play { url } => Prompt::Play(proto::PlayCallAction { url: url.clone() }),
    })
}

fn recording_prompt(
    prompt: Option<&VoicePrompt>,
) -> Option<proto::get_recording_call_action::Prompt> {
    use proto::get_recording_call_action::Prompt;

    prompt.map(|p| match p {
        VoicePrompt::Say(say) => Prompt::Say(say.into()),
        VoicePrompt::Play { url } => Prompt::Play(proto::PlayCallAction { url: url.clone() }),
    })
}

impl From<&VoiceAction> for proto::VoiceCallAction {
    fn from(action: &VoiceAction) -> Self {
        use proto::voice_call_action::Entry;

        let entry = match action {
            VoiceAction::Say(say) => Entry::Say(say.into()),
            VoiceAction::Play { url } => Entry::Play(proto::PlayCallAction { url: url.clone() }),
            VoiceAction::GetDigits(digits) => Entry::GetDigits(proto::GetDigitsCallAction {
                prompt: digits_prompt(digits.prompt.as_ref()),
                timeout: digits.timeout.map(duration_to_wire),
                finish_on_key: digits.finish_on_key.clone(),
                num_digits: digits.num_digits,
            }),
            VoiceAction::Dial(dial) => Entry::Dial(proto::DialCallAction {
                customer_numbers: dial
                    .customer_numbers
                    .iter()
                    .map(proto::CustomerNumber::from)
                    .collect(),
                record: dial.record,
                sequential: dial.sequential,
                ringback_tone: dial.ringback_tone.clone(),
                caller_id: dial.caller_id.clone(),
                max_duration: dial.max_duration,
            }),
            VoiceAction::RecordSession => Entry::RecordSession(proto::RecordSessionCallAction {}),
            VoiceAction::GetRecording(rec) => Entry::GetRecording(proto::GetRecordingCallAction {
                prompt: recording_prompt(rec.prompt.as_ref()),
                timeout: rec.timeout.map(duration_to_wire),
                max_length: rec.max_length.map(duration_to_wire),
                finish_on_key: rec.finish_on_key.clone(),
                play_beep: rec.play_beep,
                trim_silence: rec.trim_silence,
            }),
            VoiceAction::Enqueue(enqueue) => Entry::Enqueue(proto::EnqueueCallAction {
                hold_music: enqueue.hold_music.clone(),
                queue_name: enqueue.queue_name.clone(),
            }),
            VoiceAction::Dequeue(dequeue) => Entry::Dequeue(proto::DequeueCallAction {
                channel_number: Some((&dequeue.channel_number).into()),
                record: dequeue.record,
                queue_name: dequeue.queue_name.clone(),
            }),
            VoiceAction::Reject => Entry::Reject(proto::RejectCallAction {}),
            VoiceAction::Redirect { url } => {
                Entry::Redirect(proto::RedirectCallAction { url: url.clone() })
            }
        };
        Self { entry: Some(entry) }
    }
}

impl TryFrom<proto::VoiceCallAction> for VoiceAction {
    type Error = ConversionError;

    fn try_from(wire: proto::VoiceCallAction) -> Result<Self, Self::Error> {
        use proto::voice_call_action::Entry;

        Ok(match required(wire.entry, "VoiceCallAction", "entry")? {
            Entry::Say(say) => Self::Say(say.into()),
            Entry::Play(play) => Self::Play { url: play.url },
            Entry::GetDigits(digits) => Self::GetDigits(GetDigitsAction {
                prompt: digits.prompt.map(|p| match p {
                    proto::get_digits_call_action::Prompt::Say(say) => VoicePrompt::Say(say.into()),
                    proto::get_digits_call_action::Prompt::Play(play) => {
                        VoicePrompt::Play { url: play.url }
                    }
                }),
                timeout: optional_duration(digits.timeout, "timeout")?,
                finish_on_key: digits.finish_on_key,
                num_digits: digits.num_digits,
            }),
            Entry::Dial(dial) => Self::Dial(DialAction {
                customer_numbers: dial
                    .customer_numbers
                    .into_iter()
                    .map(CustomerNumber::try_from)
                    .collect::<Result<_, _>>()?,
                record: dial.record,
                sequential: dial.sequential,
                ringback_tone: dial.ringback_tone,
                caller_id: dial.caller_id,
                max_duration: dial.max_duration,
            }),
            Entry::RecordSession(_) => Self::RecordSession,
            Entry::GetRecording(rec) => Self::GetRecording(GetRecordingAction {
                prompt: rec.prompt.map(|p| match p {
                    proto::get_recording_call_action::Prompt::Say(say) => {
                        VoicePrompt::Say(say.into())
                    }
                    proto::get_recording_call_action::Prompt::Play(play) => {
                        VoicePrompt::Play { url: play.url }
                    }
                }),
                timeout: optional_duration(rec.timeout, "timeout")?,
                max_length: optional_duration(rec.max_length, "max_length")?,
                finish_on_key: rec.finish_on_key,
                play_beep: rec.play_beep,
                trim_silence: rec.trim_silence,
            }),
            Entry::Enqueue(enqueue) => Self::Enqueue(EnqueueAction {
                hold_music: enqueue.hold_music,
                queue_name: enqueue.queue_name,
            }),
            Entry::Dequeue(dequeue) => Self::Dequeue(DequeueAction {
                channel_number: required(
                    dequeue.channel_number,
                    "DequeueCallAction",
                    "channel_number",
                )?
                .try_into()?,
                record: dequeue.record,
                queue_name: dequeue.queue_name,
            }),
            Entry::Reject(_) => Self::Reject,
            Entry::Redirect(redirect) => Self::Redirect { url: redirect.url },
        })
    }
}

impl From<i32> for VoiceCallDirection {
    fn from(value: i32) -> Self {
        match proto::VoiceCallDirection::try_from(value) {
            Ok(proto::VoiceCallDirection::Inbound) => Self::Inbound,
            Ok(proto::VoiceCallDirection::Outbound) => Self::Outbound,
            Ok(proto::VoiceCallDirection::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

impl From<i32> for VoiceCallStatus {
    fn from(value: i32) -> Self {
        use proto::VoiceCallStatus as Wire;

        match Wire::try_from(value) {
            Ok(Wire::Queued) => Self::Queued,
            Ok(Wire::Answered) => Self::Answered,
            Ok(Wire::Ringing) => Self::Ringing,
            Ok(Wire::Active) => Self::Active,
            Ok(Wire::Dialing) => Self::Dialing,
            Ok(Wire::DialCompleted) => Self::DialCompleted,
            Ok(Wire::Bridged) => Self::Bridged,
            Ok(Wire::Enqueued) => Self::Enqueued,
            Ok(Wire::Dequeued) => Self::Dequeued,
            Ok(Wire::Transferred) => Self::Transferred,
            Ok(Wire::Completed) => Self::Completed,
            Ok(Wire::InsufficientCredit) => Self::InsufficientCredit,
            Ok(Wire::NotAnswered) => Self::NotAnswered,
            Ok(Wire::InvalidPhoneNumber) => Self::InvalidPhoneNumber,
            Ok(Wire::ApplicationError) => Self::ApplicationError,
            Ok(Wire::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

impl From<i32> for VoiceCallHangupCause {
    fn from(value: i32) -> Self {
        use proto::VoiceCallHangupCause as Wire;

        match Wire::try_from(value) {
            Ok(Wire::NormalClearing) => Self::NormalClearing,
            Ok(Wire::UserBusy) => Self::UserBusy,
            Ok(Wire::NoAnswer) => Self::NoAnswer,
            Ok(Wire::CallRejected) => Self::CallRejected,
            Ok(Wire::UnallocatedNumber) => Self::UnallocatedNumber,
            Ok(Wire::RecoveryOnTimerExpire) => Self::RecoveryOnTimerExpire,
            Ok(Wire::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

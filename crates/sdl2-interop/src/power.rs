//! Battery and power supply state

use crate::error::Result;
use crate::ffi::exports;
use crate::sdl::Sdl;
use std::os::raw::c_int;

/// `SDL_PowerState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Cannot determine power status
    Unknown,
    /// Not plugged in, running on the battery
    OnBattery,
    /// Plugged in, no battery available
    NoBattery,
    /// Plugged in, charging battery
    Charging,
    /// Plugged in, battery charged
    Charged,
}

impl PowerState {
    /// Map an `SDL_PowerState` value; unrecognised values read as unknown
    pub fn from_raw(value: c_int) -> Self {
        match value {
            1 => PowerState::OnBattery,
            2 => PowerState::NoBattery,
            3 => PowerState::Charging,
            4 => PowerState::Charged,
            _ => PowerState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerInfo {
    pub state: PowerState,
    /// `None` when SDL cannot tell or no battery is in use
    pub seconds_left: Option<i32>,
    /// 0..=100, `None` when unknown
    pub percentage_left: Option<i32>,
}

impl Sdl {
    /// Battery state and remaining charge
    pub fn power_info(&self) -> Result<PowerInfo> {
        let get_power_info = self.resolve(exports::GET_POWER_INFO)?;
        let mut seconds: c_int = -1;
        let mut percentage: c_int = -1;

        let state = unsafe { get_power_info(&mut seconds, &mut percentage) };

        Ok(PowerInfo {
            state: PowerState::from_raw(state),
            seconds_left: (seconds >= 0).then_some(seconds),
            percentage_left: (percentage >= 0).then_some(percentage),
        })
    }
}

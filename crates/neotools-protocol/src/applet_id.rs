/// Well-known applet IDs referenced directly by the protocol layer (the
/// system applet is the dialogue's default target; the others are used
/// widely enough across the stack to live here rather than in
/// `neotools-records`, which otherwise knows nothing about specific applets).
pub mod applet_id {
    /// Sentinel meaning "no applet" / not found.
    pub const INVALID: u16 = 0xffff;
    /// The OS applet, always present, target of the dialogue's opening switch.
    pub const SYSTEM: u16 = 0x0000;
    pub const ALPHAWORD: u16 = 0xa000;
    pub const DICTIONARY: u16 = 0xa005;
}

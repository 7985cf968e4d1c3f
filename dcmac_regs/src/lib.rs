//! Register map descriptors for the DCMAC core, the GT controller GPIOs and
//! the UDP offload network layer.
//!
//! These tables are versioned configuration data that track the FPGA image:
//! symbolic name, byte offset, access mode and (where a register is packed)
//! the named bit-fields inside the 32-bit word. All bit-field encoding and
//! decoding in the drivers goes through the single [`extract`]/[`insert`]
//! pair below, so an update to one field can never disturb its neighbors.
//!
//! Per-port registers (`C0_*`) repeat at a stride of 0x1000 per port; each
//! hardware instance of a block sits at `base + 0x100_0000 * instance`.

/// Register or field access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read-only (status); writes are still used to clear latched bits.
    Ro,
    /// Read-write control.
    Rw,
}

/// One named bit-field inside a 32-bit register word.
///
/// Invariant: `start + length <= 32`, `1 <= length <= 32`. Different views
/// may alias the same bit range on purpose (multiplexed interpretations).
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: u32,
    pub length: u32,
    pub default: u32,
    pub access: Access,
}

/// One named register: byte offset relative to the owning block, access
/// mode and the (possibly empty) ordered set of bit-fields.
#[derive(Debug, Clone, Copy)]
pub struct RegisterSpec {
    pub name: &'static str,
    pub offset: u64,
    pub access: Access,
    pub fields: &'static [FieldSpec],
}

impl RegisterSpec {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this register is part of the latched/real-time status group
    /// (these are the registers cleared by a write of all-ones).
    pub fn is_status(&self) -> bool {
        self.name.contains("STATUS")
    }

    /// Real-time status registers mirror a latched register one word below.
    pub fn is_real_time(&self) -> bool {
        self.name.contains("_RT_")
    }

    /// Group key shared by a latched register and its real-time mirror.
    pub fn status_group(&self) -> String {
        self.name.replace("_RT", "")
    }
}

/// Bit mask for a field of `length` bits (right-aligned).
pub const fn mask(length: u32) -> u32 {
    if length >= 32 {
        u32::MAX
    } else {
        (1 << length) - 1
    }
}

/// Decode a field from a register word.
pub fn extract(word: u32, field: &FieldSpec) -> u32 {
    (word >> field.start) & mask(field.length)
}

/// Encode `value` into `word`, clearing the field's bit range first and
/// leaving every other bit untouched.
pub fn insert(word: u32, field: &FieldSpec, value: u32) -> u32 {
    let m = mask(field.length) << field.start;
    (word & !m) | ((value << field.start) & m)
}

/// Whether `value` fits in the field without truncation.
pub fn fits(field: &FieldSpec, value: u64) -> bool {
    value <= mask(field.length) as u64
}

const fn rw(name: &'static str, start: u32, length: u32, default: u32) -> FieldSpec {
    FieldSpec { name, start, length, default, access: Access::Rw }
}

const fn ro(name: &'static str, start: u32, length: u32, default: u32) -> FieldSpec {
    FieldSpec { name, start, length, default, access: Access::Ro }
}

macro_rules! register {
    ($ident:ident, $offset:expr, $access:expr) => {
        pub static $ident: RegisterSpec = RegisterSpec {
            name: stringify!($ident),
            offset: $offset,
            access: $access,
            fields: &[],
        };
    };
    ($ident:ident, $offset:expr, $access:expr, [$($field:expr),+ $(,)?]) => {
        pub static $ident: RegisterSpec = RegisterSpec {
            name: stringify!($ident),
            offset: $offset,
            access: $access,
            fields: &[$($field),+],
        };
    };
}

register!(CONFIGURATION_REVISION, 0x0, Access::Ro);

register!(GLOBAL_MODE, 0x4, Access::Rw, [
    rw("ctl_tx_independent_tsmac_and_phy_mode", 0, 1, 0),
    rw("ctl_tx_all_ch_tick_reg_mode_sel", 1, 1, 0),
    rw("ctl_rx_independent_tsmac_and_phy_mode", 4, 1, 0),
    rw("ctl_rx_all_ch_tick_reg_mode_sel", 5, 1, 0),
    rw("ctl_tx_axis_cfg", 8, 1, 0),
    rw("ctl_rx_axis_cfg", 12, 1, 0),
    rw("ctl_tx_pcs_active_ports", 16, 3, 5),
    rw("ctl_rx_pcs_active_ports", 20, 3, 5),
    rw("ctl_rx_fec_errind_mode", 24, 1, 1),
    rw("ctl_tx_fec_ck_unique_flip", 25, 1, 1),
    rw("ctl_rx_fec_ck_unique_flip", 26, 1, 1),
]);

register!(TEST_DEBUG, 0x8, Access::Rw, [
    rw("ctl_test_mode_pin_char", 0, 1, 0),
    rw("ctl_test_mode_memcel", 4, 4, 0),
    rw("ctl_rx_phy_debug_select", 8, 5, 0),
    rw("ctl_rx_mac_debug_select", 13, 4, 0),
    rw("ctl_tx_phy_debug_select", 17, 4, 0),
    rw("ctl_tx_mac_debug_select", 21, 4, 0),
    rw("ctl_rx_ecc_err_clear", 25, 1, 0),
    rw("ctl_tx_ecc_err_clear", 26, 1, 0),
    rw("ctl_tx_ecc_err_count_tick", 27, 1, 0),
    rw("ctl_axi_af_thresh_override", 28, 4, 8),
]);

register!(EMA_CONFIGURATION, 0xC, Access::Rw, [
    rw("ctl_mem_ctrl", 0, 10, 0x11B),
    rw("emaa", 0, 3, 0x3),
    rw("emab", 3, 3, 0x3),
    rw("emasa", 6, 1, 0x0),
    rw("stov", 7, 1, 0x0),
    rw("mc_mem_ctrl_enable", 8, 1, 0x1),
]);

register!(CLOCK_DISABLE, 0x10, Access::Rw, [
    rw("ctl_mem_disable_rx_axi_clk", 0, 1, 0),
    rw("ctl_mem_disable_tx_axi_clk", 1, 1, 0),
    rw("ctl_mem_disable_rx_macif_clk", 2, 1, 0),
    rw("ctl_mem_disable_tx_macif_clk", 3, 1, 0),
    rw("ctl_mem_disable_rx_core_clk", 4, 1, 0),
    rw("ctl_mem_disable_tx_core_clk", 5, 1, 0),
    rw("ctl_mem_disable_rx_flexif_clk", 6, 6, 0),
    rw("ctl_mem_disable_tx_flexif_clk", 12, 6, 0),
    rw("ctl_mem_disable_rx_serdes_clk", 18, 6, 0),
    rw("ctl_mem_disable_tx_serdes_clk", 24, 6, 0),
]);

register!(BLOCK_DISABLE, 0x14, Access::Rw, [
    rw("ctl_mem_disable_rx_pcs_cpcs", 0, 6, 0),
    rw("ctl_mem_disable_rx_pcs_align_buffer", 6, 6, 0),
    rw("ctl_mem_disable_rx_pcs_decoder", 12, 1, 0),
    rw("ctl_mem_disable_tx_pcs_cpcs", 16, 6, 0),
    rw("ctl_mem_disable_tx_ts2phy", 22, 1, 0),
    rw("ctl_mem_disable_tx_pcs_encoder", 23, 1, 0),
]);

register!(MAC_CONFIG_REG_TX_WR, 0x38, Access::Rw, [
    rw("mac_tx_cfg_data", 0, 8, 0),
    rw("mac_tx_cfg_index", 8, 5, 0),
    rw("mac_tx_cfg_channel", 16, 6, 0),
    rw("mac_tx_cfg_wr", 24, 1, 0),
    rw("mac_tx_cfg_enable", 28, 1, 0),
]);

register!(MAC_CONFIG_REG_TX_RD, 0x3C, Access::Rw, [
    rw("mac_tx_cfg_data_rd", 0, 8, 0),
]);

register!(GLOBAL_CONTROL_REG_RX, 0xF0, Access::Rw, [
    rw("soft_rx_core_reset", 0, 1, 0),
    rw("soft_rx_macif_reset", 1, 1, 0),
    rw("soft_rx_axi_reset", 2, 1, 0),
]);

register!(ALL_CHANNEL_MAC_TICK_REG_RX, 0xF4, Access::Rw, [
    rw("rx_all_channel_mac_soft_pm_tick", 0, 1, 0),
]);

register!(GLOBAL_CONTROL_REG_TX, 0xF8, Access::Rw, [
    rw("soft_tx_core_reset", 0, 1, 0),
    rw("soft_tx_macif_reset", 1, 1, 0),
    rw("soft_tx_axi_reset", 2, 1, 0),
]);

register!(ALL_CHANNEL_MAC_TICK_REG_TX, 0xFC, Access::Rw, [
    rw("tx_all_channel_mac_soft_pm_tick", 0, 1, 0),
]);

register!(STAT_TX_ECC_ERR_REG, 0x1B0, Access::Ro, [
    ro("stat_tx_ecc0_err0", 0, 1, 0),
    ro("stat_tx_ecc0_err1", 1, 1, 0),
    ro("stat_tx_ecc1_err0", 2, 1, 0),
    ro("stat_tx_ecc1_err1", 3, 1, 0),
    ro("stat_tx_ecc2_err0", 4, 1, 0),
    ro("stat_tx_ecc2_err1", 5, 1, 0),
]);

register!(C0_CHANNEL_CONFIGURATION_TX, 0x1000, Access::Rw, [
    rw("c0_ctl_tx_fcs_ins_enable", 0, 1, 1),
    rw("c0_ctl_tx_ignore_fcs", 1, 1, 1),
    rw("c0_ctl_tx_send_lfi", 2, 1, 0),
    rw("c0_ctl_tx_send_rfi", 3, 1, 0),
    rw("c0_ctl_tx_send_idle", 4, 1, 0),
    rw("c0_ctl_tx_custom_preamble_enable", 5, 1, 0),
    rw("c0_ctl_tx_ipg_value", 8, 4, 0xC),
    rw("c0_ctl_tx_corrupt_fcs_on_err", 16, 2, 0),
]);

register!(C0_CHANNEL_CONFIGURATION_RX, 0x1004, Access::Rw, [
    rw("c0_ctl_rx_is_clause_49", 0, 1, 1),
    rw("c0_ctl_rx_delete_fcs", 1, 1, 1),
    rw("c0_ctl_rx_ignore_fcs", 2, 1, 0),
    rw("c0_ctl_rx_process_lfi", 3, 1, 0),
    rw("c0_ctl_rx_check_sfd", 4, 1, 0),
    rw("c0_ctl_rx_check_preamble", 5, 1, 0),
    rw("c0_ctl_rx_ignore_inrange", 6, 1, 0),
    rw("c0_ctl_rx_max_packet_len", 16, 14, 0x2580),
]);

register!(C0_CHANNEL_CONTROL_REG_RX, 0x1030, Access::Rw, [
    rw("c0_soft_rx_mac_channel_flush", 0, 1, 0),
]);

register!(C0_CHANNEL_CONTROL_REG_TX, 0x1038, Access::Rw, [
    rw("c0_soft_tx_mac_channel_flush", 0, 1, 0),
]);

register!(C0_TX_MODE_REG, 0x1040, Access::Rw, [
    rw("c0_ctl_tx_data_rate", 0, 2, 0),
    rw("c0_ctl_tx_use_custom_vl_length_minus1", 2, 1, 0),
    rw("c0_ctl_tx_use_custom_vl_marker_ids", 3, 1, 0),
    rw("c0_ctl_tx_tick_reg_mode_sel", 4, 1, 0),
    rw("c0_ctl_tx_flexif_select", 5, 2, 1),
    rw("c0_ctl_tx_flexif_am_mode", 7, 1, 0),
    rw("c0_ctl_tx_flexif_pcs_wide_mode", 8, 1, 0),
    rw("c0_ctl_tx_pma_lane_mux", 9, 2, 1),
    rw("c0_ctl_tx_alt_serdes_clk_mux_disable", 11, 1, 0),
    rw("c0_ctl_tx_fec_mode", 16, 5, 4),
    rw("c0_ctl_tx_fec_transcode_bypass", 21, 1, 0),
    rw("c0_ctl_tx_fec_four_lane_pmd", 22, 1, 0),
]);

register!(C0_RX_MODE_REG, 0x1044, Access::Rw, [
    rw("c0_ctl_rx_data_rate", 0, 2, 0),
    rw("c0_ctl_pcs_rx_ts_en", 4, 1, 0),
    rw("c0_ctl_rx_test_pattern", 8, 1, 0),
    rw("c0_ctl_rx_use_custom_vl_length_minus1", 9, 1, 0),
    rw("c0_ctl_rx_use_custom_vl_marker_ids", 10, 2, 1),
    rw("c0_ctl_rx_tick_reg_mode_sel", 11, 1, 0),
    rw("c0_ctl_rx_pma_lane_mux", 12, 2, 1),
    rw("c0_ctl_rx_fec_mode", 16, 4, 4),
    rw("c0_ctl_rx_fec_bypass_indication", 21, 1, 0),
    rw("c0_ctl_rx_fec_bypass_correction", 22, 1, 0),
    rw("c0_ctl_rx_fec_transcode_clause49", 23, 1, 0),
    rw("c0_ctl_rx_fec_alignment_bypass", 24, 1, 0),
    rw("c0_ctl_rx_fec_transcode_bypass", 25, 1, 0),
    rw("c0_ctl_rx_degrade_enable", 26, 1, 0),
    rw("c0_ctl_rx_fec_ext_align_buff_enable", 27, 1, 0),
]);

register!(C0_RX_FEC_SLICE_CONFIGURATION1, 0x1048, Access::Rw, [
    rw("c0_ctl_rx_degrade_interval", 0, 32, 0),
]);

register!(C0_RX_FEC_SLICE_CONFIGURATION2, 0x104C, Access::Rw, [
    rw("c0_ctl_rx_degrade_act_thresh", 0, 32, 0),
]);

register!(C0_RX_FEC_SLICE_CONFIGURATION3, 0x1050, Access::Rw, [
    rw("c0_ctl_rx_degrade_deact_thresh", 0, 32, 0),
]);

register!(C0_CONFIGURATION_RX, 0x10A0, Access::Rw, [
    rw("c0_ctl_rx_flexif_select", 0, 2, 1),
    rw("c0_ctl_rx_flexif_pcs_wide_mode", 2, 1, 0),
]);

register!(C0_PORT_CONTROL_REG_RX, 0x10F0, Access::Rw, [
    rw("c0_soft_rx_flexif_reset", 0, 1, 0),
    rw("c0_soft_rx_serdes_reset", 1, 1, 0),
]);

register!(C0_PORT_TICK_REG_RX, 0x10F4, Access::Rw, [
    rw("c0_rx_port_soft_pm_tick", 0, 1, 1),
]);

register!(C0_PORT_CONTROL_REG_TX, 0x10F8, Access::Rw, [
    rw("c0_soft_tx_flexif_reset", 0, 1, 1),
    rw("c0_soft_tx_serdes_reset", 1, 1, 0),
]);

register!(C0_PORT_TICK_REG_TX, 0x10FC, Access::Rw, [
    rw("c0_tx_port_soft_pm_tick", 0, 1, 1),
]);

register!(C0_STAT_CHAN_TX_MAC_STATUS_REG, 0x1100, Access::Ro, [
    ro("c0_stat_tx_local_fault", 0, 1, 0),
    ro("c0_stat_tx_tsmac_ovf", 1, 1, 0),
    ro("c0_stat_tx_tsmac_unf", 2, 1, 0),
    ro("c0_stat_tx_packet_small", 3, 1, 0),
    ro("c0_stat_tx_sic_overflow", 4, 1, 0),
]);

register!(C0_STAT_CHAN_TX_MAC_RT_STATUS_REG, 0x1104, Access::Ro, [
    ro("c0_stat_tx_local_fault", 0, 1, 0),
    ro("c0_stat_tx_tsmac_ovf", 1, 1, 0),
    ro("c0_stat_tx_tsmac_unf", 2, 1, 0),
    ro("c0_stat_tx_packet_small", 3, 1, 0),
    ro("c0_stat_tx_sic_overflow", 4, 1, 0),
]);

register!(C0_STAT_CHAN_TX_STATISTICS_READY, 0x1108, Access::Ro, [
    ro("c0_stat_tx_channel_mac_statistics_ready", 0, 1, 1),
]);

register!(C0_STAT_CHAN_RX_MAC_STATUS_REG, 0x1140, Access::Ro, [
    ro("c0_stat_rx_remote_fault", 0, 1, 0),
    ro("c0_stat_rx_local_fault", 1, 1, 0),
    ro("c0_stat_rx_internal_local_fault", 2, 1, 0),
    ro("c0_stat_rx_received_local_fault", 3, 1, 0),
    ro("c0_stat_rx_bad_preamble", 4, 1, 0),
    ro("c0_stat_rx_bad_sfd", 5, 1, 0),
    ro("c0_stat_rx_got_signal_os", 6, 1, 0),
    ro("c0_stat_rx_invalid_start", 7, 1, 0),
    ro("c0_stat_rx_bad_code", 8, 1, 0),
]);

register!(C0_STAT_CHAN_RX_MAC_RT_STATUS_REG, 0x1144, Access::Ro, [
    ro("c0_stat_rx_remote_fault", 0, 1, 0),
    ro("c0_stat_rx_local_fault", 1, 1, 0),
    ro("c0_stat_rx_internal_local_fault", 2, 1, 0),
    ro("c0_stat_rx_received_local_fault", 3, 1, 0),
    ro("c0_stat_rx_bad_preamble", 4, 1, 0),
    ro("c0_stat_rx_bad_sfd", 5, 1, 0),
    ro("c0_stat_rx_got_signal_os", 6, 1, 0),
    ro("c0_stat_rx_invalid_start", 7, 1, 0),
    ro("c0_stat_rx_bad_code", 8, 1, 0),
]);

register!(C0_STAT_CHAN_RX_STATISTICS_READY, 0x1148, Access::Ro, [
    ro("c0_stat_rx_channel_mac_statistics_ready", 0, 1, 1),
]);

register!(C0_STAT_PORT_TX_MAC_STATUS_REG, 0x1180, Access::Ro, [
    ro("c0_stat_tx_axis_unf", 0, 1, 0),
    ro("c0_stat_tx_axis_err", 0, 1, 0),
]);

register!(C0_STAT_PORT_TX_MAC_RT_STATUS_REG, 0x1184, Access::Ro, [
    ro("c0_stat_tx_axis_unf", 0, 1, 0),
    ro("c0_stat_tx_axis_err", 0, 1, 0),
]);

register!(C0_STAT_PORT_RX_MAC_STATUS_REG, 0x11C0, Access::Ro, [
    ro("c0_stat_rx_axis_fifo_overflow", 0, 1, 0),
    ro("c0_stat_rx_axis_err", 1, 1, 0),
    ro("c0_stat_rx_phy2ts_buf_err", 2, 1, 0),
    ro("c0_stat_rx_macif_fifo_ovf", 3, 1, 0),
]);

register!(C0_STAT_PORT_RX_MAC_RT_STATUS_REG, 0x11C4, Access::Ro, [
    ro("c0_stat_rx_axis_fifo_overflow", 0, 1, 0),
    ro("c0_stat_rx_axis_err", 1, 1, 0),
    ro("c0_stat_rx_phy2ts_buf_err", 2, 1, 0),
    ro("c0_stat_rx_macif_fifo_ovf", 3, 1, 0),
]);

register!(C0_STAT_PORT_TX_PHY_STATUS_REG, 0x1800, Access::Ro, [
    ro("c0_stat_tx_pcs_bad_code", 0, 1, 0),
    ro("c0_stat_tx_flex_fifo_err", 1, 1, 0),
    ro("c0_stat_tx_flex_coa", 2, 1, 0),
]);

register!(C0_STAT_PORT_TX_PHY_RT_STATUS_REG, 0x1804, Access::Ro, [
    ro("c0_stat_tx_pcs_bad_code", 0, 1, 0),
    ro("c0_stat_tx_flex_fifo_err", 1, 1, 0),
    ro("c0_stat_tx_flex_coa", 2, 1, 0),
]);

register!(C0_STAT_PORT_TX_STATISTICS_READY, 0x1808, Access::Ro);

register!(C0_STAT_PORT_TX_FEC_STATUS_REG, 0x180C, Access::Ro, [
    ro("c0_stat_tx_fec_pcs_lane_align", 0, 1, 1),
    ro("c0_stat_tx_fec_pcs_block_lock", 1, 1, 1),
    ro("c0_stat_tx_fec_pcs_am_lock", 2, 1, 1),
]);

register!(C0_STAT_PORT_TX_FEC_RT_STATUS_REG, 0x1810, Access::Ro, [
    ro("c0_stat_tx_fec_pcs_lane_align", 0, 1, 1),
    ro("c0_stat_tx_fec_pcs_block_lock", 1, 1, 1),
    ro("c0_stat_tx_fec_pcs_am_lock", 2, 1, 1),
]);

register!(C0_STAT_PORT_RX_PHY_STATUS_REG, 0x1C00, Access::Ro, [
    ro("c0_stat_rx_status", 0, 1, 1),
    ro("c0_stat_rx_block_lock", 1, 1, 0),
    ro("c0_stat_rx_aligned", 2, 1, 1),
    ro("c0_stat_rx_misaligned", 3, 1, 0),
    ro("c0_stat_rx_aligned_err", 4, 1, 0),
    ro("c0_stat_rx_hi_ber", 5, 1, 0),
    ro("c0_stat_rx_framing_err", 6, 1, 0),
    ro("c0_stat_rx_pcs_bad_code", 7, 1, 0),
    ro("c0_stat_rx_synced", 8, 1, 0),
    ro("c0_stat_rx_synced_err", 9, 1, 0),
    ro("c0_stat_rx_bip_err", 10, 1, 0),
    ro("c0_stat_rx_flex_fifo_err", 11, 1, 0),
]);

register!(C0_STAT_PORT_RX_PHY_RT_STATUS_REG, 0x1C04, Access::Ro, [
    ro("c0_stat_rx_status", 0, 1, 1),
    ro("c0_stat_rx_block_lock", 1, 1, 0),
    ro("c0_stat_rx_aligned", 2, 1, 1),
    ro("c0_stat_rx_misaligned", 3, 1, 0),
    ro("c0_stat_rx_aligned_err", 4, 1, 0),
    ro("c0_stat_rx_hi_ber", 5, 1, 0),
    ro("c0_stat_rx_framing_err", 6, 1, 0),
    ro("c0_stat_rx_pcs_bad_code", 7, 1, 0),
    ro("c0_stat_rx_synced", 8, 1, 0),
    ro("c0_stat_rx_synced_err", 9, 1, 0),
    ro("c0_stat_rx_bip_err", 10, 1, 0),
    ro("c0_stat_rx_flex_fifo_err", 11, 1, 0),
]);

register!(C0_STAT_PORT_RX_STATISTICS_READY, 0x1C08, Access::Ro);
register!(C0_STAT_PORT_RX_BLOCK_LOCK_REG, 0x1C0C, Access::Ro);
register!(C0_STAT_PORT_RX_LANE_SYNC_REG, 0x1C10, Access::Ro);
register!(C0_STAT_PORT_RX_LANE_SYNC_ERR_REG, 0x1C14, Access::Ro);

register!(C0_STAT_PORT_RX_FEC_STATUS_REG, 0x1C34, Access::Ro, [
    ro("c0_stat_rx_fec_aligned", 0, 1, 1),
    ro("c0_stat_rx_fec_hi_ser", 1, 1, 0),
    ro("c0_stat_rx_fec_lane_lock", 2, 4, 15),
    ro("c0_stat_rx_fec_degraded_ser", 6, 1, 0),
    ro("c0_stat_rx_fec_rm_degraded", 7, 1, 0),
]);

register!(C0_STAT_PORT_RX_FEC_RT_STATUS_REG, 0x1C38, Access::Ro, [
    ro("c0_stat_rx_fec_aligned", 0, 1, 1),
    ro("c0_stat_rx_fec_hi_ser", 1, 1, 0),
    ro("c0_stat_rx_fec_lane_lock", 2, 4, 0),
    ro("c0_stat_rx_fec_degraded_ser", 6, 1, 0),
    ro("c0_stat_rx_fec_rm_degraded", 7, 1, 0),
]);

/// Every DCMAC register, in map order. Drives the status/config dumps and
/// latched-flag clearing; name lookups service the raw CLI access path.
pub static DCMAC_REGS: &[&RegisterSpec] = &[
    &CONFIGURATION_REVISION,
    &GLOBAL_MODE,
    &TEST_DEBUG,
    &EMA_CONFIGURATION,
    &CLOCK_DISABLE,
    &BLOCK_DISABLE,
    &MAC_CONFIG_REG_TX_WR,
    &MAC_CONFIG_REG_TX_RD,
    &GLOBAL_CONTROL_REG_RX,
    &ALL_CHANNEL_MAC_TICK_REG_RX,
    &GLOBAL_CONTROL_REG_TX,
    &ALL_CHANNEL_MAC_TICK_REG_TX,
    &STAT_TX_ECC_ERR_REG,
    &C0_CHANNEL_CONFIGURATION_TX,
    &C0_CHANNEL_CONFIGURATION_RX,
    &C0_CHANNEL_CONTROL_REG_RX,
    &C0_CHANNEL_CONTROL_REG_TX,
    &C0_TX_MODE_REG,
    &C0_RX_MODE_REG,
    &C0_RX_FEC_SLICE_CONFIGURATION1,
    &C0_RX_FEC_SLICE_CONFIGURATION2,
    &C0_RX_FEC_SLICE_CONFIGURATION3,
    &C0_CONFIGURATION_RX,
    &C0_PORT_CONTROL_REG_RX,
    &C0_PORT_TICK_REG_RX,
    &C0_PORT_CONTROL_REG_TX,
    &C0_PORT_TICK_REG_TX,
    &C0_STAT_CHAN_TX_MAC_STATUS_REG,
    &C0_STAT_CHAN_TX_MAC_RT_STATUS_REG,
    &C0_STAT_CHAN_TX_STATISTICS_READY,
    &C0_STAT_CHAN_RX_MAC_STATUS_REG,
    &C0_STAT_CHAN_RX_MAC_RT_STATUS_REG,
    &C0_STAT_CHAN_RX_STATISTICS_READY,
    &C0_STAT_PORT_TX_MAC_STATUS_REG,
    &C0_STAT_PORT_TX_MAC_RT_STATUS_REG,
    &C0_STAT_PORT_RX_MAC_STATUS_REG,
    &C0_STAT_PORT_RX_MAC_RT_STATUS_REG,
    &C0_STAT_PORT_TX_PHY_STATUS_REG,
    &C0_STAT_PORT_TX_PHY_RT_STATUS_REG,
    &C0_STAT_PORT_TX_STATISTICS_READY,
    &C0_STAT_PORT_TX_FEC_STATUS_REG,
    &C0_STAT_PORT_TX_FEC_RT_STATUS_REG,
    &C0_STAT_PORT_RX_PHY_STATUS_REG,
    &C0_STAT_PORT_RX_PHY_RT_STATUS_REG,
    &C0_STAT_PORT_RX_STATISTICS_READY,
    &C0_STAT_PORT_RX_BLOCK_LOCK_REG,
    &C0_STAT_PORT_RX_LANE_SYNC_REG,
    &C0_STAT_PORT_RX_LANE_SYNC_ERR_REG,
    &C0_STAT_PORT_RX_FEC_STATUS_REG,
    &C0_STAT_PORT_RX_FEC_RT_STATUS_REG,
];

/// Look up a DCMAC register by symbolic name (case-insensitive).
pub fn lookup(name: &str) -> Option<&'static RegisterSpec> {
    DCMAC_REGS
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .copied()
}

/// GT controller: one packed control word behind an AXI GPIO.
pub mod gt {
    use super::{rw, FieldSpec};

    /// Bit layout of the GT control word.
    pub static CONTROL_FIELDS: &[FieldSpec] = &[
        rw("gt_reset", 0, 1, 0),
        rw("gt_line_rate", 1, 8, 0),
        rw("loopback", 9, 3, 0),
        rw("tx_precursor", 12, 6, 0),
        rw("tx_postcursor", 18, 6, 0),
        rw("tx_maincursor", 24, 6, 0),
        rw("rx_cdr_hold", 31, 1, 0),
    ];

    pub fn field(name: &str) -> Option<&'static FieldSpec> {
        CONTROL_FIELDS.iter().find(|f| f.name == name)
    }
}

/// HLS kernel control block shared by the free-running offload kernels.
pub mod hls {
    use super::{ro, rw, Access, RegisterSpec};

    pub static CONTROL: RegisterSpec = RegisterSpec {
        name: "controlreg",
        offset: 0x0,
        access: Access::Rw,
        fields: &[
            rw("ap_start", 0, 1, 0),
            ro("ap_done", 1, 1, 0),
            ro("ap_idle", 2, 1, 0),
            ro("ap_ready", 3, 1, 0),
            rw("ap_continue", 4, 1, 0),
            rw("auto_restart", 7, 1, 0),
        ],
    };

    pub static GLOBAL_INT: RegisterSpec =
        RegisterSpec { name: "globalintreg", offset: 0x4, access: Access::Rw, fields: &[] };
    pub static INT_ENABLE: RegisterSpec =
        RegisterSpec { name: "intenable", offset: 0x8, access: Access::Rw, fields: &[] };
    pub static INT_STATUS: RegisterSpec =
        RegisterSpec { name: "intstatus", offset: 0x10, access: Access::Rw, fields: &[] };

    /// `ap_start` with `auto_restart`, for free-running kernels.
    pub const AUTOSTART: u32 = 0x81;
}

/// UDP offload network layer register map.
///
/// The ARP table holds 256 entries: one IP word per entry, two MAC words
/// per entry, and validity packed four-entries-per-word (one flag byte
/// each). Socket table arrays are striped at 8 bytes per entry.
pub mod nl {
    /// MAC address, low word first (two consecutive words).
    pub const MAC_ADDRESS: u64 = 0x0010;
    pub const IP_ADDRESS: u64 = 0x0018;
    pub const GATEWAY: u64 = 0x001C;
    pub const IP_MASK: u64 = 0x0020;
    /// ARP discovery trigger, rising-edge sensitive.
    pub const ARP_DISCOVERY: u64 = 0x0030;
    /// Offload clock frequency in MHz.
    pub const FREQUENCY: u64 = 0x0034;
    pub const DEBUG_RESET_COUNTERS: u64 = 0x0038;

    pub const ARP_VALID: u64 = 0x0100;
    pub const ARP_IP: u64 = 0x0400;
    pub const ARP_MAC: u64 = 0x0800;
    pub const ARP_ENTRIES: usize = 256;

    pub const UDP_THEIR_IP: u64 = 0x1010;
    pub const UDP_THEIR_PORT: u64 = 0x1090;
    pub const UDP_MY_PORT: u64 = 0x1110;
    pub const UDP_VALID: u64 = 0x1190;
    /// Hardware-reported socket table capacity.
    pub const UDP_NUM_SOCKETS: u64 = 0x1210;
    /// Byte stride between consecutive socket table entries.
    pub const SOCKET_STRIDE: u64 = 8;

    /// One monitoring probe: packets at +0, bytes at +4, cycles at +8.
    #[derive(Debug, Clone, Copy)]
    pub struct ProbeSpec {
        pub name: &'static str,
        pub offset: u64,
    }

    pub static RX_PROBES: &[ProbeSpec] = &[
        ProbeSpec { name: "ethernet", offset: 0x0200 },
        ProbeSpec { name: "packet_handler", offset: 0x0210 },
        ProbeSpec { name: "arp", offset: 0x0220 },
        ProbeSpec { name: "icmp", offset: 0x0230 },
        ProbeSpec { name: "udp", offset: 0x0240 },
        ProbeSpec { name: "app", offset: 0x0250 },
    ];

    pub static TX_PROBES: &[ProbeSpec] = &[
        ProbeSpec { name: "arp", offset: 0x0260 },
        ProbeSpec { name: "icmp", offset: 0x0270 },
        ProbeSpec { name: "ethernet_header_inserter", offset: 0x0280 },
        ProbeSpec { name: "ethernet", offset: 0x0290 },
        ProbeSpec { name: "udp", offset: 0x02A0 },
        ProbeSpec { name: "app", offset: 0x02B0 },
    ];
}

/// MAC statistics counters, relative to a port's statistics block.
/// `wide` counters occupy two words, LSB first.
pub mod stats {
    #[derive(Debug, Clone, Copy)]
    pub struct StatSpec {
        pub name: &'static str,
        pub offset: u64,
        pub wide: bool,
    }

    const fn wide(name: &'static str, offset: u64) -> StatSpec {
        StatSpec { name, offset, wide: true }
    }

    const fn narrow(name: &'static str, offset: u64) -> StatSpec {
        StatSpec { name, offset, wide: false }
    }

    pub static TX_STATS: &[StatSpec] = &[
        wide("TOTAL_BYTES", 0x00),
        wide("TOTAL_GOOD_BYTES", 0x08),
        wide("TOTAL_PACKETS", 0x10),
        wide("TOTAL_GOOD_PACKETS", 0x18),
        wide("FRAME_ERROR", 0x20),
        wide("BAD_FCS", 0x28),
        wide("PACKET_64_BYTES", 0x30),
        wide("PACKET_65_127_BYTES", 0x38),
        wide("PACKET_128_255_BYTES", 0x40),
        wide("PACKET_256_511_BYTES", 0x48),
        wide("PACKET_512_1023_BYTES", 0x50),
        wide("PACKET_1024_1518_BYTES", 0x58),
        wide("PACKET_1519_1522_BYTES", 0x60),
        wide("PACKET_1523_1548_BYTES", 0x68),
        wide("PACKET_1549_2047_BYTES", 0x70),
        wide("PACKET_2048_4095_BYTES", 0x78),
        wide("PACKET_4096_8191_BYTES", 0x80),
        wide("PACKET_8192_9215_BYTES", 0x88),
        narrow("PACKET_LARGE", 0x90),
        wide("UNICAST", 0x98),
        wide("MULTICAST", 0xA0),
        wide("BROADCAST", 0xA8),
        wide("VLAN", 0xB0),
        wide("PAUSE", 0xB8),
        wide("USER_PAUSE", 0xC0),
        wide("MAC_CYCLE_COUNT", 0xC8),
        narrow("ECC_CORRECTABLE_COUNT", 0xD0),
        narrow("ECC_UNCORRECTABLE_COUNT", 0xD8),
    ];

    pub static RX_STATS: &[StatSpec] = &[
        wide("TOTAL_BYTES", 0x00),
        wide("TOTAL_GOOD_BYTES", 0x08),
        wide("TOTAL_PACKETS", 0x10),
        wide("TOTAL_GOOD_PACKETS", 0x18),
        wide("PACKET_SMALL", 0x20),
        wide("BAD_CODE_COUNT", 0x28),
        wide("BAD_FCS", 0x30),
        wide("PACKET_BAD_FCS", 0x38),
        wide("STOMPED_FCS", 0x40),
        wide("TRUNCATED", 0x48),
        wide("PACKET_64_BYTES", 0x50),
        wide("PACKET_65_127_BYTES", 0x58),
        wide("PACKET_128_255_BYTES", 0x60),
        wide("PACKET_256_511_BYTES", 0x68),
        wide("PACKET_512_1023_BYTES", 0x70),
        wide("PACKET_1024_1518_BYTES", 0x78),
        wide("PACKET_1519_1522_BYTES", 0x80),
        wide("PACKET_1523_1548_BYTES", 0x88),
        wide("PACKET_1549_2047_BYTES", 0x90),
        wide("PACKET_2048_4095_BYTES", 0x98),
        wide("PACKET_4096_8191_BYTES", 0xA0),
        wide("PACKET_8192_9215_BYTES", 0xA8),
        narrow("TOOLONG", 0xB0),
        narrow("PACKET_LARGE", 0xB8),
        narrow("JABBER", 0xC0),
        narrow("OVERSIZE", 0xC8),
        wide("UNICAST", 0xD0),
        wide("MULTICAST", 0xD8),
        wide("BROADCAST", 0xE0),
        wide("VLAN", 0xE8),
        wide("PAUSE", 0xF0),
        wide("USER_PAUSE", 0xF8),
        wide("INRANGEERR", 0x100),
        wide("MAC_CYCLE_COUNT", 0x108),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_fields() -> impl Iterator<Item = &'static FieldSpec> {
        DCMAC_REGS
            .iter()
            .flat_map(|r| r.fields.iter())
            .chain(gt::CONTROL_FIELDS.iter())
            .chain(hls::CONTROL.fields.iter())
    }

    #[test]
    fn test_field_geometry() {
        for f in all_fields() {
            assert!(f.length >= 1 && f.length <= 32, "{}", f.name);
            assert!(f.start + f.length <= 32, "{}", f.name);
            assert!(fits(f, f.default as u64), "{}", f.name);
        }
    }

    #[test]
    fn test_insert_extract_roundtrip() {
        for f in all_fields() {
            for word in [0u32, u32::MAX, 0xA5A5_5A5A] {
                for value in [0u32, 1, mask(f.length)] {
                    let updated = insert(word, f, value);
                    assert_eq!(extract(updated, f), value & mask(f.length));
                }
            }
        }
    }

    #[test]
    fn test_insert_preserves_neighbors() {
        for f in all_fields() {
            let m = mask(f.length) << f.start;
            for word in [0u32, u32::MAX, 0xDEAD_BEEF] {
                let updated = insert(word, f, 0x5555_5555);
                assert_eq!(updated & !m, word & !m, "{}", f.name);
            }
        }
    }

    #[test]
    fn test_insert_masks_wide_values() {
        let f = gt::field("loopback").unwrap();
        let updated = insert(0, f, 0xFF);
        assert_eq!(extract(updated, f), 0x7);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup("global_mode").is_some());
        assert!(lookup("GLOBAL_MODE").is_some());
        assert!(lookup("no_such_register").is_none());
    }

    #[test]
    fn test_status_grouping() {
        let rt = &C0_STAT_PORT_RX_PHY_RT_STATUS_REG;
        let latched = &C0_STAT_PORT_RX_PHY_STATUS_REG;
        assert!(rt.is_status() && rt.is_real_time());
        assert!(latched.is_status() && !latched.is_real_time());
        assert_eq!(rt.status_group(), latched.status_group());
    }

    #[test]
    fn test_statistics_ready_is_not_a_status_register() {
        // A clear-on-write sweep must not touch the READY strobes.
        assert!(!C0_STAT_CHAN_TX_STATISTICS_READY.is_status());
        assert!(!C0_STAT_PORT_RX_STATISTICS_READY.is_status());
    }
}

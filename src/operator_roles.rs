// Code generated by gen_operators. DO NOT EDIT.

use crate::operators::Role;

pub(crate) static OPERATOR_TABLE: &[(u64, &str, Role)] = &[
    (92270642682, "Sledge", Role::Attack),
    (92270642708, "Thatcher", Role::Attack),
    (92270644215, "Ash", Role::Attack),
    (92270644189, "Thermite", Role::Attack),
    (92270644267, "Twitch", Role::Attack),
    (92270644241, "Montagne", Role::Attack),
    (104189662384, "Glaz", Role::Attack),
    (104189662358, "Fuze", Role::Attack),
    (104189663607, "Blitz", Role::Attack),
    (104189663633, "IQ", Role::Attack),
    (172486128563, "Buck", Role::Attack),
    (172486128589, "Blackbeard", Role::Attack),
    (189853007237, "Capitao", Role::Attack),
    (189853007211, "Hibana", Role::Attack),
    (217267270467, "Jackal", Role::Attack),
    (234234780086, "Ying", Role::Attack),
    (256996201382, "Zofia", Role::Attack),
    (272388053702, "Dokkaebi", Role::Attack),
    (286200288639, "Lion", Role::Attack),
    (286200288613, "Finka", Role::Attack),
    (304543322122, "Maverick", Role::Attack),
    (318142067362, "Nomad", Role::Attack),
    (333136662846, "Gridlock", Role::Attack),
    (346055126262, "Nokk", Role::Attack),
    (359268547193, "Amaru", Role::Attack),
    (373711624351, "Kali", Role::Attack),
    (386098331135, "Iana", Role::Attack),
    (398064238380, "Ace", Role::Attack),
    (411576834244, "Zero", Role::Attack),
    (424839724166, "Flores", Role::Attack),
    (437941708585, "Osa", Role::Attack),
    (451159339681, "Sens", Role::Attack),
    (464280201320, "Grim", Role::Attack),
    (477218671796, "Brava", Role::Attack),
    (490239347531, "Ram", Role::Attack),
    (92270642734, "Smoke", Role::Defense),
    (92270642760, "Mute", Role::Defense),
    (92270644163, "Castle", Role::Defense),
    (92270644137, "Pulse", Role::Defense),
    (92270644293, "Doc", Role::Defense),
    (92270644319, "Rook", Role::Defense),
    (104189662306, "Kapkan", Role::Defense),
    (104189662332, "Tachanka", Role::Defense),
    (104189663581, "Jager", Role::Defense),
    (104189663555, "Bandit", Role::Defense),
    (172486128615, "Frost", Role::Defense),
    (172486128641, "Valkyrie", Role::Defense),
    (189853007263, "Caveira", Role::Defense),
    (189853007289, "Echo", Role::Defense),
    (217267270493, "Mira", Role::Defense),
    (234234780112, "Lesion", Role::Defense),
    (256996201408, "Ela", Role::Defense),
    (272388053728, "Vigil", Role::Defense),
    (286200288665, "Maestro", Role::Defense),
    (286200288691, "Alibi", Role::Defense),
    (304543322148, "Clash", Role::Defense),
    (318142067388, "Kaid", Role::Defense),
    (333136662872, "Mozzie", Role::Defense),
    (346055126288, "Warden", Role::Defense),
    (359268547219, "Goyo", Role::Defense),
    (373711624377, "Wamai", Role::Defense),
    (386098331161, "Oryx", Role::Defense),
    (398064238406, "Melusi", Role::Defense),
    (411576834270, "Aruni", Role::Defense),
    (424839724192, "Thunderbird", Role::Defense),
    (437941708611, "Thorn", Role::Defense),
    (451159339707, "Azami", Role::Defense),
    (464280201346, "Solis", Role::Defense),
    (477218671822, "Fenrir", Role::Defense),
    (490239347557, "Tubarao", Role::Defense),
    (359656345734, "Recruit", Role::Attack),
];

//! Running the plugin artifact directly just identifies it.

fn main() {
    keystone_plugin::announce(keystone_plugin_echo::PLUGIN_NAME);
}
